use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of a sub-topic inside a course: module index plus sub-topic index.
///
/// Courses are generated once and never reordered, so positions stay stable
/// for the lifetime of a course snapshot chain.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubTopicRef {
    module: usize,
    sub_topic: usize,
}

impl SubTopicRef {
    #[must_use]
    pub const fn new(module: usize, sub_topic: usize) -> Self {
        Self { module, sub_topic }
    }

    /// Index of the owning module.
    #[must_use]
    pub fn module(&self) -> usize {
        self.module
    }

    /// Index of the sub-topic within its module.
    #[must_use]
    pub fn sub_topic(&self) -> usize {
        self.sub_topic
    }
}

impl fmt::Debug for SubTopicRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubTopicRef({}, {})", self.module, self.sub_topic)
    }
}

impl fmt::Display for SubTopicRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 1-based, as shown to learners.
        write!(f, "{}.{}", self.module + 1, self.sub_topic + 1)
    }
}
