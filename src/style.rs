//! Settings bridge: push visual settings into the page's ruby styles
//!
//! The full snapshot is applied once on load; afterwards only the fields a
//! SETTING_CHANGED notification carries are re-applied.

use crate::config::{Settings, SettingsPatch, MAX_PCT};

pub const VISIBLE_STYLE: &str = "miri-ruby-visible";
pub const SIZE_STYLE: &str = "miri-ruby";
pub const COLOR_STYLE: &str = "miri-ruby-color";
pub const SELECT_STYLE: &str = "miri-furigana-select";

/// Style writer. Each call targets one named style block.
pub trait StyleSink {
    fn set_visibility(&self, style: &str, visible: bool);
    fn set_size(&self, style: &str, pct: u8);
    fn set_color(&self, style: &str, color: &str);
    fn set_selectable(&self, style: &str, selectable: bool);
}

pub fn apply_settings<S: StyleSink + ?Sized>(sink: &S, settings: &Settings) {
    sink.set_visibility(VISIBLE_STYLE, settings.enabled);
    sink.set_size(SIZE_STYLE, settings.pct.min(MAX_PCT));
    sink.set_color(COLOR_STYLE, &settings.color);
    sink.set_selectable(SELECT_STYLE, settings.furigana_selectable);
}

/// Re-apply only the changed fields. Returns how many were applied.
pub fn apply_patch<S: StyleSink + ?Sized>(sink: &S, patch: &SettingsPatch) -> usize {
    let mut applied = 0;
    if let Some(enabled) = patch.enabled {
        sink.set_visibility(VISIBLE_STYLE, enabled);
        applied += 1;
    }
    if let Some(pct) = patch.pct {
        sink.set_size(SIZE_STYLE, pct.min(MAX_PCT));
        applied += 1;
    }
    if let Some(color) = &patch.color {
        sink.set_color(COLOR_STYLE, color);
        applied += 1;
    }
    if let Some(selectable) = patch.furigana_selectable {
        sink.set_selectable(SELECT_STYLE, selectable);
        applied += 1;
    }
    applied
}
