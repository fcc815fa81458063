use std::collections::HashSet;

use lakitu_geo::interpret::GeoOptions;
use lakitu_gfx::interpret::GfxOptions;
use lakitu_source::MissingReferencePolicy;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// The name that stands for "no display list" or "no layout".
    pub null_sentinel: String,
    /// Switch selectors that do not gate their cases.
    pub inert_switch_selectors: HashSet<String>,
    /// Root layouts with the one-level-deeper `GEO_CLOSE_NODE` behavior.
    pub asymmetric_close_layouts: HashSet<String>,
    /// Recursion cap for layout branches and display list calls.
    pub max_branch_depth: usize,
    pub animation_frame: i32,
    pub missing_reference_policy: MissingReferencePolicy,
    /// Interpret each display list at most once per compiler.
    pub memoize_display_lists: bool,
}

impl Default for SceneConfig {
    fn default() -> Self {
        let geo = GeoOptions::default();
        Self {
            null_sentinel: geo.null_sentinel,
            inert_switch_selectors: geo.inert_switch_selectors,
            asymmetric_close_layouts: geo.asymmetric_close_layouts,
            max_branch_depth: 64,
            animation_frame: 0,
            missing_reference_policy: MissingReferencePolicy::Skip,
            memoize_display_lists: true,
        }
    }
}

impl SceneConfig {
    pub fn geo_options(&self) -> GeoOptions {
        GeoOptions {
            null_sentinel: self.null_sentinel.clone(),
            inert_switch_selectors: self.inert_switch_selectors.clone(),
            asymmetric_close_layouts: self.asymmetric_close_layouts.clone(),
            max_branch_depth: self.max_branch_depth,
            animation_frame: self.animation_frame,
            missing_reference_policy: self.missing_reference_policy,
        }
    }

    pub fn gfx_options(&self) -> GfxOptions {
        GfxOptions {
            max_branch_depth: self.max_branch_depth,
            missing_reference_policy: self.missing_reference_policy,
        }
    }
}
