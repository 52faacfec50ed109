//! Encoders turn arbitrary text into blink sequences.
//!
//! An encoder may answer synchronously ([`Encoding::Ready`]) or hand back a
//! future ([`Encoding::Deferred`]); callers treat both the same way. Plain
//! closures `Fn(&str) -> EncodeResult` are encoders, and [`deferred`] adapts
//! async closures.

mod morse;

use futures::future::BoxFuture;
use std::future::Future;

use crate::blink::Blinks;

pub use morse::{MorseEncoder, Symbol, to_morse};

pub type EncodeError = Box<dyn std::error::Error + Send + Sync>;
pub type EncodeResult = Result<Blinks, EncodeError>;

pub enum Encoding {
    Ready(EncodeResult),
    Deferred(BoxFuture<'static, EncodeResult>),
}

impl std::fmt::Debug for Encoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ready(result) => f.debug_tuple("Ready").field(result).finish(),
            Self::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

pub trait Encoder: Send + Sync {
    fn encode(&self, input: &str) -> Encoding;
}

impl<F> Encoder for F
where
    F: Fn(&str) -> EncodeResult + Send + Sync,
{
    fn encode(&self, input: &str) -> Encoding {
        Encoding::Ready(self(input))
    }
}

/// Encoder backed by an async function
pub struct Deferred<F> {
    handler: F,
}

/// Wrap an async function as an [`Encoder`]
pub fn deferred<F, Fut>(handler: F) -> Deferred<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = EncodeResult> + Send + 'static,
{
    Deferred { handler }
}

impl<F, Fut> Encoder for Deferred<F>
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = EncodeResult> + Send + 'static,
{
    fn encode(&self, input: &str) -> Encoding {
        Encoding::Deferred(Box::pin((self.handler)(input.to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blink::BlinkDescriptor;

    #[test]
    fn test_closure_is_a_ready_encoder() {
        let encoder = |input: &str| -> EncodeResult {
            Ok(vec![BlinkDescriptor::default(); input.len()].into())
        };

        match encoder.encode("abc") {
            Encoding::Ready(Ok(blinks)) => assert_eq!(blinks.into_vec().len(), 3),
            other => panic!("unexpected encoding: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_deferred_encoder_resolves_later() {
        let encoder = deferred(|input: String| async move {
            if input.is_empty() {
                return Err::<Blinks, EncodeError>("empty input".into());
            }
            Ok(BlinkDescriptor::default().into())
        });

        let Encoding::Deferred(fut) = encoder.encode("x") else {
            panic!("expected a deferred encoding");
        };
        assert_eq!(fut.await.unwrap().into_vec().len(), 1);

        let Encoding::Deferred(fut) = encoder.encode("") else {
            panic!("expected a deferred encoding");
        };
        assert_eq!(fut.await.unwrap_err().to_string(), "empty input");
    }
}
