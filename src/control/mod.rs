//! The order toggle.
//!
//! [`render_toggle`] derives the toggle's complete visual state from the
//! current preference. [`ControlBinding`] pushes that state to the host's
//! [`ControlSurface`] and turns clicks into store writes.

use crate::host::ControlSurface;
use crate::model::OrderPreference;
use crate::store::{self, PreferenceStore};
use futures::stream::LocalBoxStream;
use std::fmt;
use std::rc::Rc;
use tracing::{debug, warn};

/// One selectable item of the toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleItem {
    /// Preference written when the item is clicked.
    pub preference: OrderPreference,
    /// Item text.
    pub label: &'static str,
    /// Whether the item is marked selected.
    pub selected: bool,
}

/// Full visual state of the toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleView {
    /// Text on the collapsed toggle: the current preference's label.
    pub caption: &'static str,
    /// `Default` then `Reversed`.
    pub items: [ToggleItem; 2],
}

impl ToggleView {
    /// The preference of the selected item.
    pub fn selected(&self) -> Option<OrderPreference> {
        self.items
            .iter()
            .find(|item| item.selected)
            .map(|item| item.preference)
    }

    /// Number of items marked selected. Always one for rendered views.
    pub fn selected_count(&self) -> usize {
        self.items.iter().filter(|item| item.selected).count()
    }
}

impl fmt::Display for ToggleView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} v", self.caption)?;
        for item in &self.items {
            let mark = if item.selected { "x" } else { " " };
            write!(f, " | [{}] {}", mark, item.label)?;
        }
        Ok(())
    }
}

/// Render the toggle for `preference`.
///
/// Both items start unselected and exactly one is then marked, so the
/// result always has a single selection.
pub fn render_toggle(preference: OrderPreference) -> ToggleView {
    let mut items = OrderPreference::ALL.map(|item| ToggleItem {
        preference: item,
        label: item.label(),
        selected: false,
    });
    for item in items.iter_mut() {
        item.selected = item.preference == preference;
    }
    ToggleView {
        caption: preference.label(),
        items,
    }
}

/// The toggle attached to one thread view.
#[derive(Debug)]
pub struct ControlBinding<S> {
    surface: S,
    shown: Option<OrderPreference>,
}

impl<S: ControlSurface> ControlBinding<S> {
    /// Wrap a control container. Nothing is rendered yet.
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            shown: None,
        }
    }

    /// Reflect `preference` in the toggle.
    pub fn refresh(&mut self, preference: OrderPreference) {
        self.surface.render(&render_toggle(preference));
        self.shown = Some(preference);
    }

    /// The preference currently shown, if mounted.
    pub fn shown(&self) -> Option<OrderPreference> {
        self.shown
    }

    /// The underlying surface.
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Clicks on the toggle's items.
    pub fn selections(&self) -> LocalBoxStream<'static, OrderPreference> {
        self.surface.selections()
    }
}

/// Write a clicked preference.
///
/// Fire-and-forget: a failed write is logged and dropped. The visual state
/// is not touched here; it follows the store's change notification, which
/// every bound view receives, including the one that was clicked.
///
/// Returns whether the write succeeded.
pub async fn select(store: Rc<dyn PreferenceStore>, key: String, preference: OrderPreference) -> bool {
    debug!(key = %key, preference = %preference, "Order toggle clicked");
    match store::write_preference(store.as_ref(), &key, preference).await {
        Ok(()) => true,
        Err(error) => {
            warn!(key = %key, preference = %preference, error = %error, "Failed to save order preference");
            false
        }
    }
}
