use super::{ReplyError, ReplySource};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Offline reply source cycling through a fixed list
pub struct CannedReplySource {
    replies: Vec<String>,
    next: AtomicUsize,
}

impl CannedReplySource {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: replies.into_iter().map(Into::into).collect(),
            next: AtomicUsize::new(0),
        }
    }
}

#[async_trait::async_trait]
impl ReplySource for CannedReplySource {
    async fn request(&self) -> Result<String, ReplyError> {
        if self.replies.is_empty() {
            return Err(ReplyError::Unavailable("no canned replies configured".to_string()));
        }

        let index = self.next.fetch_add(1, Ordering::SeqCst) % self.replies.len();
        Ok(self.replies[index].clone())
    }

    fn name(&self) -> &str {
        "canned"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_canned_replies_cycle() {
        let source = CannedReplySource::new(["one", "two"]);

        assert_eq!(source.request().await.unwrap(), "one");
        assert_eq!(source.request().await.unwrap(), "two");
        assert_eq!(source.request().await.unwrap(), "one");
    }

    #[tokio::test]
    async fn test_empty_canned_source_fails() {
        let source = CannedReplySource::new(Vec::<String>::new());

        assert!(matches!(source.request().await, Err(ReplyError::Unavailable(_))));
    }
}
