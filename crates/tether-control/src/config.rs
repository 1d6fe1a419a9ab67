//! Control surface configuration.

/// Presentation settings for [`ControlSurface`](crate::surface::ControlSurface).
#[derive(Clone, Debug)]
pub struct ControlConfig {
    /// Path prefix of rendered images. Default: `"/render/"`.
    pub render_prefix: String,
    /// Quantity selected for rendering at startup. Default: `"m"`.
    pub default_quantity: String,
    /// Component selected for rendering at startup. Default: `""`
    /// (all components).
    pub default_component: String,
    /// Page title.
    pub title: String,
    /// Version string shown on the page.
    pub version: String,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            render_prefix: "/render/".to_string(),
            default_quantity: "m".to_string(),
            default_component: String::new(),
            title: "tether".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
