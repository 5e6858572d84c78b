use std::cell::RefCell;
use std::fmt::Debug;
use std::rc::{Rc, Weak};

use crate::*;

#[derive(Debug)]
struct Checkout<A> {
    anchor: A,
    desired: Position,
    generation: u64,
}

#[derive(Debug)]
struct SlotInner<A> {
    current: Option<Checkout<A>>,
    next_generation: u64,
    gap: f64,
}

impl<A: Debug> SlotInner<A> {
    fn release(&mut self, generation: u64) -> bool {
        match &self.current {
            Some(checkout) if checkout.generation == generation => {
                log::trace!("overlay released from {:?}", checkout.anchor);
                self.current = None;
                true
            }
            _ => false,
        }
    }
}

/// Holder of the single floating overlay (tooltip) a view may show at a time.
///
/// Acquiring hands out an [`OverlayLease`]; acquiring again releases whatever lease was out before. The overlay is
/// also released when its lease drops or when its anchor is reported removed.
#[derive(Debug)]
pub struct OverlaySlot<A> {
    inner: Rc<RefCell<SlotInner<A>>>,
}

impl<A: Copy + PartialEq + Debug> OverlaySlot<A> {
    pub fn new(gap: f64) -> Self {
        Self {
            inner: Rc::new(RefCell::new(SlotInner {
                current: None,
                next_generation: 0,
                gap,
            })),
        }
    }

    pub fn acquire(&self, anchor: A, desired: Position) -> OverlayLease<A> {
        let mut inner = self.inner.borrow_mut();
        if let Some(previous) = inner.current.take() {
            log::trace!("overlay on {:?} replaced by {:?}", previous.anchor, anchor);
        }
        let generation = inner.next_generation;
        inner.next_generation += 1;
        inner.current = Some(Checkout {
            anchor,
            desired,
            generation,
        });
        OverlayLease {
            slot: Rc::downgrade(&self.inner),
            anchor,
            generation,
        }
    }

    pub fn active_anchor(&self) -> Option<A> {
        self.inner
            .borrow()
            .current
            .as_ref()
            .map(|checkout| checkout.anchor)
    }

    pub fn is_active(&self) -> bool {
        self.inner.borrow().current.is_some()
    }

    /// Removal-watch hook: the element `anchor` points at left the page.
    pub fn anchor_removed(&self, anchor: A) -> bool {
        let mut inner = self.inner.borrow_mut();
        match inner.current.as_ref().map(|checkout| (checkout.anchor, checkout.generation)) {
            Some((current, generation)) if current == anchor => inner.release(generation),
            _ => false,
        }
    }

    pub fn release_all(&self) -> bool {
        self.inner.borrow_mut().current.take().is_some()
    }
}

impl<A: Copy + PartialEq + Debug> Default for OverlaySlot<A> {
    fn default() -> Self {
        Self::new(DEFAULT_OVERLAY_GAP)
    }
}

/// Scoped claim on an [`OverlaySlot`], released on drop.
#[derive(Debug)]
pub struct OverlayLease<A: Debug> {
    slot: Weak<RefCell<SlotInner<A>>>,
    anchor: A,
    generation: u64,
}

impl<A: Copy + PartialEq + Debug> OverlayLease<A> {
    pub fn anchor(&self) -> A {
        self.anchor
    }

    /// False once another lease took over, the anchor went away or the slot was dropped.
    pub fn is_active(&self) -> bool {
        let Some(inner) = self.slot.upgrade() else {
            return false;
        };
        let inner = inner.borrow();
        inner
            .current
            .as_ref()
            .is_some_and(|checkout| checkout.generation == self.generation)
    }

    /// Viewport position for the overlay, `None` when the lease is no longer active.
    pub fn place(&self, anchor_rect: &Rect, floating: Size, viewport: Size) -> Option<Point> {
        let inner = self.slot.upgrade()?;
        let inner = inner.borrow();
        let checkout = inner
            .current
            .as_ref()
            .filter(|checkout| checkout.generation == self.generation)?;
        Some(place_with_gap(
            anchor_rect,
            floating,
            checkout.desired,
            viewport,
            inner.gap,
        ))
    }
}

impl<A: Debug> Drop for OverlayLease<A> {
    fn drop(&mut self) {
        if let Some(inner) = self.slot.upgrade() {
            inner.borrow_mut().release(self.generation);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: Size = Size::new(800.0, 600.0);

    #[test]
    fn acquiring_again_releases_previous_lease() {
        let slot = OverlaySlot::default();

        let first = slot.acquire((0, 0), Position::Top);
        let second = slot.acquire((1, 1), Position::Bottom);

        assert!(!first.is_active());
        assert!(second.is_active());
        assert_eq!(slot.active_anchor(), Some((1, 1)));
    }

    #[test]
    fn dropping_a_stale_lease_keeps_the_current_one() {
        let slot = OverlaySlot::default();

        let first = slot.acquire((0, 0), Position::Top);
        let second = slot.acquire((1, 1), Position::Top);
        drop(first);

        assert!(second.is_active());
        drop(second);
        assert!(!slot.is_active());
    }

    #[test]
    fn anchor_removal_releases_only_matching_anchor() {
        let slot = OverlaySlot::default();
        let lease = slot.acquire((2, 3), Position::Right);

        assert!(!slot.anchor_removed((0, 0)));
        assert!(lease.is_active());
        assert!(slot.anchor_removed((2, 3)));
        assert!(!lease.is_active());
        assert_eq!(
            lease.place(&Rect::new(0.0, 0.0, 10.0, 10.0), Size::new(5.0, 5.0), VIEWPORT),
            None
        );
    }

    #[test]
    fn lease_places_with_slot_gap() {
        let slot = OverlaySlot::new(4.0);
        let lease = slot.acquire((0, 0), Position::Bottom);
        let anchor = Rect::new(100.0, 100.0, 20.0, 20.0);

        let point = lease.place(&anchor, Size::new(20.0, 10.0), VIEWPORT);

        assert_eq!(point, Some(Point { left: 100.0, top: 124.0 }));
    }

    #[test]
    fn lease_outliving_slot_is_inactive() {
        let slot = OverlaySlot::default();
        let lease = slot.acquire((0, 0), Position::Top);
        drop(slot);

        assert!(!lease.is_active());
    }
}
