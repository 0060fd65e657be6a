use chrono::{DateTime, Utc};

use crate::{
    domain::value_objects::ObjectKey,
    ports::keys::{Clock, KeyGenerator},
};

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at a single instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Builds keys of the form `{prefix}/{unix seconds}/{file name}`
#[derive(Debug, Clone)]
pub struct TimestampKeyGenerator<C> {
    clock: C,
    prefix: String,
    file_name: String,
}

impl TimestampKeyGenerator<SystemClock> {
    pub fn system(prefix: impl Into<String>) -> Self {
        Self::new(SystemClock, prefix)
    }
}

impl<C: Clock> TimestampKeyGenerator<C> {
    pub fn new(clock: C, prefix: impl Into<String>) -> Self {
        Self {
            clock,
            prefix: prefix.into(),
            file_name: "test-file.txt".to_string(),
        }
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }
}

impl<C: Clock> KeyGenerator for TimestampKeyGenerator<C> {
    fn next_key(&self) -> ObjectKey {
        let timestamp = self.clock.now().timestamp();
        let prefix = self.prefix.trim_end_matches('/');
        if prefix.is_empty() {
            ObjectKey::new(format!("{}/{}", timestamp, self.file_name))
        } else {
            ObjectKey::new(format!("{}/{}/{}", prefix, timestamp, self.file_name))
        }
    }
}

/// Always hands out the same key
#[derive(Debug, Clone)]
pub struct FixedKeyGenerator(pub ObjectKey);

impl KeyGenerator for FixedKeyGenerator {
    fn next_key(&self) -> ObjectKey {
        self.0.clone()
    }
}
