//! Turns a generator snapshot into what the result panel shows.

use crate::orchestrator::{LifecycleState, Snapshot};

/// The one thing the result panel displays.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum View {
    /// Nothing submitted yet.
    Placeholder,
    /// Generation running; shows the narrator's message.
    Loading {
        /// Current narrator message.
        message: String,
    },
    /// The latest attempt failed.
    Error {
        /// Message for the user.
        message: String,
    },
    /// The generated thumbnail.
    Thumbnail {
        /// Data URL of the image.
        data_url: String,
    },
}

impl View {
    /// Short name used for CSS classes and the status API.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Placeholder => "placeholder",
            Self::Loading { .. } => "loading",
            Self::Error { .. } => "error",
            Self::Thumbnail { .. } => "thumbnail",
        }
    }
}

/// Picks the view for `snapshot`.
pub fn present(snapshot: &Snapshot) -> View {
    match &snapshot.lifecycle {
        LifecycleState::Idle => View::Placeholder,
        LifecycleState::Loading => View::Loading {
            message: snapshot.loading_message.unwrap_or_default().to_string(),
        },
        LifecycleState::Failed { message } => View::Error {
            message: message.clone(),
        },
        LifecycleState::Succeeded { thumbnail } => View::Thumbnail {
            data_url: thumbnail.to_data_url(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::GeneratedThumbnail;
    use crate::constants::{LOADING_MESSAGES, VALIDATION_MESSAGE};

    fn snapshot(lifecycle: LifecycleState, loading_message: Option<&'static str>) -> Snapshot {
        Snapshot {
            lifecycle,
            attempt: 1,
            loading_message,
            title: "My Epic Vlog".to_string(),
            headshot_preview: None,
            started_at: None,
            finished_at: None,
        }
    }

    #[test]
    fn each_state_has_one_view() {
        assert_eq!(
            present(&snapshot(LifecycleState::Idle, None)),
            View::Placeholder
        );
        assert_eq!(
            present(&snapshot(LifecycleState::Loading, Some(LOADING_MESSAGES[3]))),
            View::Loading {
                message: LOADING_MESSAGES[3].to_string()
            }
        );
        assert_eq!(
            present(&snapshot(
                LifecycleState::Failed {
                    message: VALIDATION_MESSAGE.to_string()
                },
                None
            )),
            View::Error {
                message: VALIDATION_MESSAGE.to_string()
            }
        );

        let view = present(&snapshot(
            LifecycleState::Succeeded {
                thumbnail: GeneratedThumbnail::new("aGk=", "image/jpeg"),
            },
            None,
        ));
        assert_eq!(view.kind(), "thumbnail");
        assert_eq!(
            view,
            View::Thumbnail {
                data_url: "data:image/jpeg;base64,aGk=".to_string()
            }
        );
    }
}
