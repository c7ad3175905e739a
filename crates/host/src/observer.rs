//! Intersection observation between element layout and the viewport.
//!
//! Each observer keeps the last reported state per target. When the host
//! renders a frame it recomputes every target's state and hands each observer
//! one batch holding the targets whose state changed (a freshly observed
//! target always reports once, as in browsers).

use crate::dom::{Document, LayoutRect, NodeKey};
use crate::page::Page;
use anyhow::{Result, anyhow, bail};
use std::collections::BTreeMap;
use std::rc::Rc;

/// Handle to an intersection observer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(u64);

/// `rootMargin`: grows (positive) or shrinks (negative) the viewport used for intersection.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
pub struct RootMargin {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl RootMargin {
    pub const ZERO: Self = Self {
        top: 0.0,
        right: 0.0,
        bottom: 0.0,
        left: 0.0,
    };

    /// Parse CSS margin shorthand in pixels: one to four lengths, e.g. `"0px 0px -50px 0px"`.
    ///
    /// # Errors
    /// Returns an error for empty input, more than four values, or non-pixel units.
    pub fn parse(input: &str) -> Result<Self> {
        let values = input
            .split_ascii_whitespace()
            .map(parse_pixels)
            .collect::<Result<Vec<f64>>>()?;
        match values.as_slice() {
            [all] => Ok(Self {
                top: *all,
                right: *all,
                bottom: *all,
                left: *all,
            }),
            [vertical, horizontal] => Ok(Self {
                top: *vertical,
                right: *horizontal,
                bottom: *vertical,
                left: *horizontal,
            }),
            [top, horizontal, bottom] => Ok(Self {
                top: *top,
                right: *horizontal,
                bottom: *bottom,
                left: *horizontal,
            }),
            [top, right, bottom, left] => Ok(Self {
                top: *top,
                right: *right,
                bottom: *bottom,
                left: *left,
            }),
            _ => bail!("rootMargin {input:?} must have one to four values"),
        }
    }
}

fn parse_pixels(token: &str) -> Result<f64> {
    let number = token.strip_suffix("px").unwrap_or(token);
    if number.len() == token.len() && number != "0" {
        bail!("rootMargin value {token:?} must be in px");
    }
    number
        .parse::<f64>()
        .map_err(|err| anyhow!("rootMargin value {token:?}: {err}"))
}

/// Observer configuration.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ObserverOptions {
    /// Fraction of the target that must be visible (0.0 ..= 1.0).
    pub threshold: f64,
    pub root_margin: RootMargin,
}

impl Default for ObserverOptions {
    fn default() -> Self {
        Self {
            threshold: 0.0,
            root_margin: RootMargin::ZERO,
        }
    }
}

/// The visible vertical band of the document.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Viewport {
    pub top: f64,
    pub height: f64,
}

/// One target's observation result.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct IntersectionEntry {
    pub target: NodeKey,
    pub is_intersecting: bool,
    pub intersection_ratio: f64,
}

/// Observer callback: the batch for this frame and the observer that produced it.
pub type ObserverCallback = Rc<dyn Fn(&Page, &[IntersectionEntry], ObserverId)>;

/// Compute `(is_intersecting, ratio)` for an element against the viewport.
/// Elements without layout are not rendered and never intersect.
pub fn compute_intersection(
    rect: Option<LayoutRect>,
    viewport: Viewport,
    options: ObserverOptions,
) -> (bool, f64) {
    let Some(rect) = rect else {
        return (false, 0.0);
    };
    let root_top = viewport.top - options.root_margin.top;
    let root_bottom = viewport.top + viewport.height + options.root_margin.bottom;
    let overlap_top = rect.top.max(root_top);
    let overlap_bottom = rect.bottom().min(root_bottom);
    let touching = overlap_bottom >= overlap_top;
    if !touching {
        return (false, 0.0);
    }
    let ratio = if rect.height > 0.0 {
        ((overlap_bottom - overlap_top) / rect.height).clamp(0.0, 1.0)
    } else {
        1.0
    };
    let intersecting = if options.threshold > 0.0 {
        ratio >= options.threshold
    } else {
        true
    };
    (intersecting, ratio)
}

struct ObservedTarget {
    node: NodeKey,
    last_intersecting: Option<bool>,
}

struct Observer {
    options: ObserverOptions,
    callback: ObserverCallback,
    targets: Vec<ObservedTarget>,
}

/// A batch ready for delivery.
pub struct ObserverBatch {
    pub observer: ObserverId,
    pub callback: ObserverCallback,
    pub entries: Vec<IntersectionEntry>,
}

#[derive(Default)]
pub struct ObserverRegistry {
    next_id: u64,
    observers: BTreeMap<ObserverId, Observer>,
}

impl ObserverRegistry {
    pub fn create(&mut self, options: ObserverOptions, callback: ObserverCallback) -> ObserverId {
        self.next_id = self.next_id.wrapping_add(1);
        let id = ObserverId(self.next_id);
        self.observers.insert(
            id,
            Observer {
                options,
                callback,
                targets: Vec::new(),
            },
        );
        id
    }

    /// Start observing `node`. Observing the same node twice is a no-op.
    pub fn observe(&mut self, id: ObserverId, node: NodeKey) -> bool {
        let Some(observer) = self.observers.get_mut(&id) else {
            return false;
        };
        if observer.targets.iter().any(|target| target.node == node) {
            return false;
        }
        observer.targets.push(ObservedTarget {
            node,
            last_intersecting: None,
        });
        true
    }

    pub fn unobserve(&mut self, id: ObserverId, node: NodeKey) -> bool {
        let Some(observer) = self.observers.get_mut(&id) else {
            return false;
        };
        let before = observer.targets.len();
        observer.targets.retain(|target| target.node != node);
        before != observer.targets.len()
    }

    pub fn disconnect(&mut self, id: ObserverId) -> bool {
        self.observers.remove(&id).is_some()
    }

    pub fn is_observing(&self, id: ObserverId, node: NodeKey) -> bool {
        self.observers
            .get(&id)
            .is_some_and(|observer| observer.targets.iter().any(|target| target.node == node))
    }

    pub fn observed_count(&self, id: ObserverId) -> usize {
        self.observers
            .get(&id)
            .map_or(0, |observer| observer.targets.len())
    }

    /// Recompute every target and collect one batch per observer with state changes.
    pub fn collect_batches(&mut self, document: &Document, viewport: Viewport) -> Vec<ObserverBatch> {
        let mut batches = Vec::new();
        for (id, observer) in &mut self.observers {
            let mut entries = Vec::new();
            for target in &mut observer.targets {
                let (is_intersecting, intersection_ratio) =
                    compute_intersection(document.layout(target.node), viewport, observer.options);
                if target.last_intersecting != Some(is_intersecting) {
                    target.last_intersecting = Some(is_intersecting);
                    entries.push(IntersectionEntry {
                        target: target.node,
                        is_intersecting,
                        intersection_ratio,
                    });
                }
            }
            if !entries.is_empty() {
                batches.push(ObserverBatch {
                    observer: *id,
                    callback: Rc::clone(&observer.callback),
                    entries,
                });
            }
        }
        batches
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: Viewport = Viewport {
        top: 0.0,
        height: 800.0,
    };

    fn reveal_options() -> Result<ObserverOptions> {
        Ok(ObserverOptions {
            threshold: 0.1,
            root_margin: RootMargin::parse("0px 0px -50px 0px")?,
        })
    }

    #[test]
    fn root_margin_shorthand() -> Result<()> {
        let reveal = RootMargin::parse("0px 0px -50px 0px")?;
        assert_eq!(reveal, RootMargin { bottom: -50.0, ..RootMargin::ZERO });
        assert_eq!(
            RootMargin::parse("10px 0")?,
            RootMargin { top: 10.0, bottom: 10.0, ..RootMargin::ZERO }
        );
        assert!(RootMargin::parse("10%").is_err());
        assert!(RootMargin::parse("").is_err());
        assert!(RootMargin::parse("1px 2px 3px 4px 5px").is_err());
        Ok(())
    }

    #[test]
    fn bottom_margin_contracts_the_viewport() -> Result<()> {
        let options = reveal_options()?;
        // 100px tall element whose top sits 30px above the viewport bottom:
        // 30% visible without the margin, but inside the 50px dead band with it.
        let rect = LayoutRect::new(770.0, 100.0);
        assert!(!compute_intersection(Some(rect), VIEWPORT, options).0);
        assert!(compute_intersection(Some(rect), VIEWPORT, ObserverOptions::default()).0);
        Ok(())
    }

    #[test]
    fn threshold_requires_visible_fraction() -> Result<()> {
        let options = reveal_options()?;
        // 5% of a 200px element visible above the contracted bottom edge (750px).
        let barely = LayoutRect::new(740.0, 200.0);
        assert!(!compute_intersection(Some(barely), VIEWPORT, options).0);
        let enough = LayoutRect::new(700.0, 200.0);
        let (intersecting, ratio) = compute_intersection(Some(enough), VIEWPORT, options);
        assert!(intersecting);
        assert!((ratio - 0.25).abs() < 1e-9);
        assert!(!compute_intersection(None, VIEWPORT, options).0);
        Ok(())
    }
}
