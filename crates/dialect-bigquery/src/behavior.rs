use std::{fmt, sync::Arc};

use chrono::{DateTime, Utc};
use quarry_core::{Entity, Result, SaveListener, SaveOptions, Value};

pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

const DEFAULT_CREATED_FIELD: &str = "created";
const DEFAULT_MODIFIED_FIELD: &str = "modified";
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// Shared `created`/`modified` stamping.
#[derive(Clone)]
struct TouchFields {
    created: Option<String>,
    modified: Option<String>,
    clock: Clock,
}

impl Default for TouchFields {
    fn default() -> Self {
        Self {
            created: Some(DEFAULT_CREATED_FIELD.to_string()),
            modified: Some(DEFAULT_MODIFIED_FIELD.to_string()),
            clock: Arc::new(Utc::now),
        }
    }
}

impl fmt::Debug for TouchFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TouchFields")
            .field("created", &self.created)
            .field("modified", &self.modified)
            .finish_non_exhaustive()
    }
}

impl TouchFields {
    fn touch(&self, entity: &mut Entity, format: &str) {
        let now = Value::String((self.clock)().format(format).to_string());
        if entity.is_new()
            && let Some(created) = &self.created
        {
            entity.set(created.clone(), now.clone());
        }
        if let Some(modified) = &self.modified {
            entity.set(modified.clone(), now);
        }
    }

    fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    fn with_created(mut self, field: Option<&str>) -> Self {
        self.created = field.map(str::to_string);
        self
    }

    fn with_modified(mut self, field: Option<&str>) -> Self {
        self.modified = field.map(str::to_string);
        self
    }
}

/// Stamps `created` (new entities only) and `modified` as DATETIME text.
#[derive(Debug, Clone, Default)]
pub struct DateTimeBehavior {
    fields: TouchFields,
}

impl DateTimeBehavior {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_clock(self, clock: Clock) -> Self {
        Self {
            fields: self.fields.with_clock(clock),
        }
    }

    /// `None` disables stamping of the creation field.
    #[must_use]
    pub fn with_created_field(self, field: Option<&str>) -> Self {
        Self {
            fields: self.fields.with_created(field),
        }
    }

    /// `None` disables stamping of the modification field.
    #[must_use]
    pub fn with_modified_field(self, field: Option<&str>) -> Self {
        Self {
            fields: self.fields.with_modified(field),
        }
    }
}

impl SaveListener for DateTimeBehavior {
    fn before_save(&self, entity: &mut Entity, _options: &SaveOptions) -> Result<()> {
        self.fields.touch(entity, DATETIME_FORMAT);
        Ok(())
    }
}

/// Same fields as `DateTimeBehavior`, stamped as UTC TIMESTAMP text with
/// microseconds.
#[derive(Debug, Clone, Default)]
pub struct TimestampBehavior {
    fields: TouchFields,
}

impl TimestampBehavior {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_clock(self, clock: Clock) -> Self {
        Self {
            fields: self.fields.with_clock(clock),
        }
    }

    #[must_use]
    pub fn with_created_field(self, field: Option<&str>) -> Self {
        Self {
            fields: self.fields.with_created(field),
        }
    }

    #[must_use]
    pub fn with_modified_field(self, field: Option<&str>) -> Self {
        Self {
            fields: self.fields.with_modified(field),
        }
    }
}

impl SaveListener for TimestampBehavior {
    fn before_save(&self, entity: &mut Entity, _options: &SaveOptions) -> Result<()> {
        self.fields.touch(entity, TIMESTAMP_FORMAT);
        Ok(())
    }
}
