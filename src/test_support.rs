//! Helpers shared by the unit tests.

use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose;
use tokio::sync::Notify;

use crate::client::{GeneratedThumbnail, GenerationClient, GenerationError};
use crate::constants::LOADING_MESSAGES;
use crate::narrator::Narrator;

/// A small but real PNG.
pub(crate) fn sample_png() -> Vec<u8> {
    let img = image::RgbImage::from_fn(48, 27, |x, y| {
        image::Rgb([(x * 5) as u8, (y * 9) as u8, ((x + y) * 3) as u8])
    });
    let mut bytes = Cursor::new(Vec::new());
    img.write_to(&mut bytes, image::ImageFormat::Png)
        .expect("encode sample png");
    bytes.into_inner()
}

pub(crate) fn test_narrator() -> Narrator {
    Narrator::new(LOADING_MESSAGES, Duration::from_millis(50))
}

pub(crate) type Call = (String, String, String);

/// Stands in for the generation service, recording every call.
pub(crate) struct ScriptedClient {
    succeed: bool,
    calls: Mutex<Vec<Call>>,
    gate: Option<Arc<Notify>>,
}

impl ScriptedClient {
    pub(crate) fn succeeding() -> Self {
        Self {
            succeed: true,
            calls: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            succeed: false,
            ..Self::succeeding()
        }
    }

    /// Holds every call until the returned handle is notified.
    pub(crate) fn gated(mut self) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        self.gate = Some(Arc::clone(&gate));
        (self, gate)
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub(crate) fn thumbnail() -> GeneratedThumbnail {
        GeneratedThumbnail::new(general_purpose::STANDARD.encode(sample_png()), "image/png")
    }
}

impl GenerationClient for ScriptedClient {
    async fn generate_thumbnail(
        &self,
        title: &str,
        image: &str,
        mime_type: &str,
    ) -> Result<GeneratedThumbnail, GenerationError> {
        self.calls.lock().expect("calls lock").push((
            title.to_string(),
            image.to_string(),
            mime_type.to_string(),
        ));
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.succeed {
            Ok(Self::thumbnail())
        } else {
            Err(GenerationError::Api {
                status: 500,
                message: "scripted failure".to_string(),
            })
        }
    }
}
