use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::time::Duration;

use super::traits::{GenerationRequest, GenerativeBackend};
use crate::error::GenerationError;

/// One canned behaviour of a [`ScriptedBackend`].
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Text(String),
    Fail(String),
    /// Reply after sleeping, to exercise deadlines.
    Delayed(Duration, String),
}

/// Replays canned replies in order and records the prompts it was sent.
///
/// Used for offline runs and tests. Once the script is exhausted every call
/// fails, which drives callers onto their fallback path.
#[derive(Default)]
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<ScriptedReply>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    pub fn new<I>(replies: I) -> Self
    where
        I: IntoIterator<Item = ScriptedReply>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Convenience: every reply is plain text.
    pub fn with_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(texts.into_iter().map(|t| ScriptedReply::Text(t.into())))
    }

    /// Prompts received so far, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().map(|p| p.len()).unwrap_or_default()
    }

    fn next_reply(&self) -> Option<ScriptedReply> {
        self.replies.lock().ok().and_then(|mut r| r.pop_front())
    }
}

impl GenerativeBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    fn generate_structured<'a>(
        &'a self,
        request: &'a GenerationRequest,
        _deadline: Duration,
    ) -> Pin<Box<dyn Future<Output = Result<String, GenerationError>> + Send + 'a>> {
        Box::pin(async move {
            if let Ok(mut prompts) = self.prompts.lock() {
                prompts.push(request.prompt.clone());
            }

            match self.next_reply() {
                Some(ScriptedReply::Text(text)) => Ok(text),
                Some(ScriptedReply::Delayed(delay, text)) => {
                    tokio::time::sleep(delay).await;
                    Ok(text)
                }
                Some(ScriptedReply::Fail(message)) => Err(GenerationError::Request {
                    backend: "scripted".into(),
                    message,
                }),
                None => Err(GenerationError::Request {
                    backend: "scripted".into(),
                    message: "script exhausted".into(),
                }),
            }
        })
    }
}
