/// Marker the interviewer instruction asks the model to reply with when an
/// answer needs no follow-up.
pub const ACCEPTANCE_MARKER: &str = "OK";

/// Decides whether a reasoning-service reply accepts the candidate's answer.
///
/// Carried by the controller as `Arc<dyn ReplyClassifier>` so the marker test
/// can be replaced by a structured verdict without touching the state machine.
pub trait ReplyClassifier: Send + Sync {
    fn is_accepted(&self, reply: &str) -> bool;
}

/// Case-sensitive substring test for a fixed marker anywhere in the reply.
pub struct MarkerClassifier {
    marker: String,
}

impl MarkerClassifier {
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }
}

impl Default for MarkerClassifier {
    fn default() -> Self {
        Self::new(ACCEPTANCE_MARKER)
    }
}

impl ReplyClassifier for MarkerClassifier {
    fn is_accepted(&self, reply: &str) -> bool {
        reply.contains(self.marker.as_str())
    }
}
