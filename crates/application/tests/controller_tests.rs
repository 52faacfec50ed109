use application::{ControllerSettings, LedController};
use domain::{BlinkDescriptor, BrightnessBounds, DomainError, EncodeResult};
use infrastructure::InMemoryAttributeStore;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const ROOT: &str = "/fakeleds";

fn controller_over(store: &InMemoryAttributeStore) -> LedController {
    LedController::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        ControllerSettings {
            root: PathBuf::from(ROOT),
            rate: 1.0,
        },
    )
}

#[tokio::test]
async fn test_discover_lists_leds_under_root() {
    let store = InMemoryAttributeStore::new();
    store.add_led(Path::new(ROOT), "red:led1", 1, &["none"]);
    store.add_led(Path::new(ROOT), "green:led0", 255, &["none"]);
    store.add_led(Path::new("/elsewhere"), "blue:led2", 255, &["none"]);

    let controller = controller_over(&store);

    assert_eq!(controller.discover(), vec!["green:led0", "red:led1"]);
    assert_eq!(controller.root(), Path::new(ROOT));
}

#[tokio::test]
async fn test_open_loads_bounds() {
    let store = InMemoryAttributeStore::new();
    store.add_led(Path::new(ROOT), "green:led0", 255, &["none"]);
    let controller = controller_over(&store);

    let led = controller.open(Some("green:led0")).unwrap();

    assert_eq!(led.id(), "green:led0");
    assert_eq!(led.location(), Path::new(ROOT).join("green:led0"));
    assert_eq!(led.bounds(), BrightnessBounds { min: 0, max: 255 });
    assert_eq!(led.to_string(), "LedDevice(green:led0)");
}

#[tokio::test]
async fn test_open_without_id_picks_the_only_led() {
    let store = InMemoryAttributeStore::new();
    store.add_led(Path::new(ROOT), "green:led0", 255, &["none"]);
    let controller = controller_over(&store);

    let led = controller.open(None).unwrap();
    assert_eq!(led.id(), "green:led0");

    store.add_led(Path::new(ROOT), "red:led1", 1, &["none"]);
    let err = controller.open(None).unwrap_err();
    assert!(matches!(err, DomainError::Configuration(_)));
}

#[tokio::test]
async fn test_open_without_any_led_fails() {
    let store = InMemoryAttributeStore::new();
    let controller = controller_over(&store);

    assert!(matches!(
        controller.open(None),
        Err(DomainError::Configuration(_))
    ));
}

#[tokio::test]
async fn test_open_unknown_led_names_it() {
    let store = InMemoryAttributeStore::new();
    store.add_led(Path::new(ROOT), "green:led0", 255, &["none"]);
    let controller = controller_over(&store);

    match controller.open(Some("purple:led9")) {
        Err(DomainError::Configuration(message)) => {
            assert!(message.contains("purple:led9"));
            assert!(message.contains(ROOT));
        }
        other => panic!("expected a configuration error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_open_with_broken_max_brightness_fails() {
    let store = InMemoryAttributeStore::new();
    store.add_led(Path::new(ROOT), "green:led0", 255, &["none"]);
    store.set(&Path::new(ROOT).join("green:led0"), "max_brightness", "lots");
    let controller = controller_over(&store);

    assert!(matches!(
        controller.open(Some("green:led0")),
        Err(DomainError::Configuration(_))
    ));
}

#[tokio::test]
async fn test_handles_of_one_controller_share_encoders() {
    let store = InMemoryAttributeStore::new();
    store.add_led(Path::new(ROOT), "green:led0", 255, &["none"]);
    store.add_led(Path::new(ROOT), "red:led1", 1, &["none"]);
    let controller = controller_over(&store);

    let green = controller.open(Some("green:led0")).unwrap();
    let red = controller.open(Some("red:led1")).unwrap();
    controller
        .register_encoder("single", |_input: &str| -> EncodeResult {
            Ok(BlinkDescriptor::new(50.0, 10.0).into())
        })
        .unwrap();

    assert!(green.encoders().contains(&"single".to_string()));
    assert!(red.encoders().contains(&"single".to_string()));
}

// --- Sysfs ---

fn fake_sysfs() -> PathBuf {
    let root = std::env::temp_dir().join(format!("ledctl_leds_{}", uuid::Uuid::new_v4()));
    let led = root.join("beaglebone:green:usr0");
    fs::create_dir_all(&led).unwrap();
    fs::write(led.join("brightness"), "0\n").unwrap();
    fs::write(led.join("max_brightness"), "255\n").unwrap();
    fs::write(led.join("trigger"), "[none] timer heartbeat\n").unwrap();

    // Not a LED: lacks a trigger file
    let other = root.join("not-a-led");
    fs::create_dir_all(&other).unwrap();
    fs::write(other.join("brightness"), "0\n").unwrap();
    root
}

#[tokio::test]
async fn test_sysfs_end_to_end() {
    let root = fake_sysfs();
    let controller = LedController::sysfs(ControllerSettings {
        root: root.clone(),
        rate: 20.0,
    });

    assert_eq!(controller.discover(), vec!["beaglebone:green:usr0"]);
    let led = controller.open(None).unwrap();
    let dir = root.join("beaglebone:green:usr0");

    led.turn_on().await.unwrap();
    assert_eq!(led.current_value().unwrap(), 255);
    assert_eq!(fs::read_to_string(dir.join("brightness")).unwrap(), "255");

    let info = led.triggers().unwrap();
    assert_eq!(info.current.as_deref(), Some("none"));
    led.set_trigger("heartbeat").await.unwrap();
    assert_eq!(fs::read_to_string(dir.join("trigger")).unwrap(), "heartbeat");

    led.blink(BlinkDescriptor::default()).await.unwrap();
    assert_eq!(led.current_value().unwrap(), 0);

    fs::remove_dir_all(&root).unwrap();
}

#[tokio::test]
async fn test_sysfs_missing_root_has_no_leds() {
    let root = std::env::temp_dir().join(format!("ledctl_missing_{}", uuid::Uuid::new_v4()));
    let controller = LedController::sysfs(ControllerSettings { root, rate: 1.0 });

    assert!(controller.discover().is_empty());
    assert!(controller.open(Some("green:led0")).is_err());
}
