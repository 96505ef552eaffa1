//! # Runtime configuration.
//!
//! Provides [`Config`], the settings shared by the watcher and the tail coordinator, and
//! [`Selector`], the label/field filter used to open the event subscription.
//!
//! ## Sentinel values
//! - `step_prefix = ""` → container names are displayed unchanged
//! - `bus_capacity = 0` → clamped to 1 by [`Bus`](crate::events::Bus)

/// Global configuration for the watcher and the tail coordinator.
///
/// ## Field semantics
/// - `bus_capacity`: lifecycle event ring buffer size (min 1)
/// - `step_prefix`: prefix stripped from container names before display
/// - `follow`: open log streams in follow mode (block for new lines)
#[derive(Clone, Debug)]
pub struct Config {
    /// Capacity of the lifecycle event bus.
    ///
    /// Subscribers lagging behind more than `bus_capacity` events skip older items.
    pub bus_capacity: usize,

    /// Prefix the orchestrator uses to namespace step containers.
    ///
    /// `"step-build"` is displayed as `[build]`.
    pub step_prefix: String,

    /// Whether log streams block for new lines instead of ending at the current end.
    pub follow: bool,
}

impl Config {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Strips the configured step prefix from a container name.
    ///
    /// # Example
    /// ```
    /// use podreactor::Config;
    ///
    /// let cfg = Config::default();
    /// assert_eq!(cfg.display_name("step-build"), "build");
    /// assert_eq!(cfg.display_name("sidecar"), "sidecar");
    /// ```
    pub fn display_name<'a>(&self, container: &'a str) -> &'a str {
        if self.step_prefix.is_empty() {
            return container;
        }
        container
            .strip_prefix(self.step_prefix.as_str())
            .unwrap_or(container)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `bus_capacity = 1024`
    /// - `step_prefix = "step-"`
    /// - `follow = true`
    fn default() -> Self {
        Self {
            bus_capacity: 1024,
            step_prefix: "step-".to_string(),
            follow: true,
        }
    }
}

/// Label and field filters applied to the event subscription.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selector {
    /// Label selector, e.g. `buildrun.shipwright.io/name=my-run`.
    pub labels: Option<String>,
    /// Field selector, e.g. `metadata.name=my-pod`.
    pub fields: Option<String>,
}

impl Selector {
    /// Creates an empty selector (matches everything in the namespace).
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the label selector.
    pub fn labels(mut self, labels: impl Into<String>) -> Self {
        self.labels = Some(labels.into());
        self
    }

    /// Sets the field selector.
    pub fn fields(mut self, fields: impl Into<String>) -> Self {
        self.fields = Some(fields.into());
        self
    }
}
