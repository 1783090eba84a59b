//! Fragment

use crate::common::*;
use crate::material::*;
use crate::spectrum::*;
use std::fmt;
use std::sync::Arc;

/// One surface's contribution to a pixel at a given depth, and a link to the
/// fragment behind it.
///
/// A chain of fragments is kept in increasing depth order. Light reaching the
/// camera through a fragment is `additive + multiplicative * (light from
/// behind)`. An opaque fragment has a black multiplicative colour, so nothing
/// behind it is visible and chains never keep fragments behind one.
pub struct Fragment {
    /// Colour emitted or reflected towards the camera.
    additive: Spectrum,

    /// Fraction of the light from behind that passes through.
    multiplicative: Spectrum,

    /// Camera space depth.
    depth: Float,

    /// True if nothing behind this fragment is visible.
    opaque: bool,

    /// Depth of the nearest opaque fragment in the chain starting here, or
    /// `INFINITY` if there is none.
    opaque_depth: Float,

    /// Material enclosed by the surface this fragment belongs to.
    material: Option<ArcMaterial>,

    /// True if the view ray enters `material` at this fragment, false if it
    /// leaves.
    entering: bool,

    /// The fragment behind this one.
    next: Option<Box<Fragment>>,
}

impl Fragment {
    /// Returns a new opaque fragment.
    ///
    /// * `color` - Surface colour.
    /// * `depth` - Camera space depth.
    pub fn opaque(color: Spectrum, depth: Float) -> Self {
        Self {
            additive: color,
            multiplicative: Spectrum::ZERO,
            depth,
            opaque: true,
            opaque_depth: depth,
            material: None,
            entering: false,
            next: None,
        }
    }

    /// Returns a new partially transparent fragment. A black multiplicative
    /// colour makes it opaque.
    ///
    /// * `additive`       - Colour added at this surface.
    /// * `multiplicative` - Fraction of light from behind that passes through.
    /// * `depth`          - Camera space depth.
    pub fn transparent(additive: Spectrum, multiplicative: Spectrum, depth: Float) -> Self {
        if multiplicative.is_black() {
            return Self::opaque(additive, depth);
        }
        Self {
            additive,
            multiplicative,
            depth,
            opaque: false,
            opaque_depth: INFINITY,
            material: None,
            entering: false,
            next: None,
        }
    }

    /// Attach the material enclosed by this fragment's surface.
    ///
    /// * `material` - The material.
    /// * `entering` - True if the view ray enters the material here.
    pub fn with_material(mut self, material: ArcMaterial, entering: bool) -> Self {
        self.material = Some(material);
        self.entering = entering;
        self
    }

    /// Returns the colour added at this fragment.
    pub fn additive_color(&self) -> Spectrum {
        self.additive
    }

    /// Returns the fraction of light from behind that passes through.
    pub fn multiplicative_color(&self) -> Spectrum {
        self.multiplicative
    }

    /// Returns the camera space depth.
    pub fn depth(&self) -> Float {
        self.depth
    }

    /// Returns true if nothing behind this fragment is visible.
    pub fn is_opaque(&self) -> bool {
        self.opaque
    }

    /// Returns the depth of the nearest opaque fragment in the chain starting
    /// at this fragment, or `INFINITY`.
    pub fn opaque_depth(&self) -> Float {
        self.opaque_depth
    }

    /// Returns the enclosed material, if any.
    pub fn material(&self) -> Option<&ArcMaterial> {
        self.material.as_ref()
    }

    /// Returns true if the view ray enters the material at this fragment.
    pub fn is_entering(&self) -> bool {
        self.entering
    }

    /// Returns the fragment behind this one.
    pub fn next_fragment(&self) -> Option<&Fragment> {
        self.next.as_deref()
    }

    /// Insert a fragment into the chain that starts at this fragment, keeping
    /// the chain in depth order, and return the chain's new first fragment.
    /// That may be `fragment` itself if it lies in front of this one, so
    /// callers must replace their reference with the returned value.
    ///
    /// A fragment at the same depth as existing ones goes behind them, so the
    /// result is stable with respect to insertion order. Fragments hidden
    /// behind an opaque fragment are dropped.
    ///
    /// * `fragment` - The fragment to insert. Any chain it carries is dropped.
    pub fn insert_next_fragment(mut self: Box<Self>, mut fragment: Box<Fragment>) -> Box<Fragment> {
        fragment.next = None;
        fragment.opaque_depth = if fragment.opaque { fragment.depth } else { INFINITY };
        let depth = fragment.depth;

        // In front of the whole chain.
        if depth < self.depth {
            if !fragment.opaque {
                fragment.opaque_depth = self.opaque_depth;
                fragment.next = Some(self);
            }
            return fragment;
        }

        // Hidden behind an opaque fragment.
        if depth >= self.opaque_depth {
            return self;
        }

        let new_opaque_depth = fragment.opaque_depth;
        let mut cursor: &mut Fragment = &mut self;
        loop {
            cursor.opaque_depth = min(cursor.opaque_depth, new_opaque_depth);
            if !cursor.next.as_ref().is_some_and(|next| next.depth <= depth) {
                break;
            }
            cursor = match cursor.next.as_deref_mut() {
                Some(next) => next,
                None => unreachable!(),
            };
        }

        let rest = cursor.next.take();
        if !fragment.opaque {
            if let Some(rest) = rest {
                fragment.opaque_depth = rest.opaque_depth;
                fragment.next = Some(rest);
            }
        }
        cursor.next = Some(fragment);
        self
    }
}

impl Drop for Fragment {
    /// Unlink the chain iteratively so long chains do not recurse.
    fn drop(&mut self) {
        let mut next = self.next.take();
        while let Some(mut fragment) = next {
            next = fragment.next.take();
        }
    }
}

impl fmt::Debug for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fragment")
            .field("additive", &self.additive)
            .field("multiplicative", &self.multiplicative)
            .field("depth", &self.depth)
            .field("opaque", &self.opaque)
            .field("opaque_depth", &self.opaque_depth)
            .field("material", &self.material.as_ref().map(|m| m.name().to_owned()))
            .field("entering", &self.entering)
            .finish()
    }
}

/// Iterator over a chain of fragments from front to back.
pub struct FragmentIter<'a> {
    next: Option<&'a Fragment>,
}

impl<'a> FragmentIter<'a> {
    /// Returns an iterator starting at `head`.
    ///
    /// * `head` - First fragment of the chain.
    pub fn new(head: Option<&'a Fragment>) -> Self {
        Self { next: head }
    }
}

impl<'a> Iterator for FragmentIter<'a> {
    type Item = &'a Fragment;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.next_fragment();
        Some(current)
    }
}

/// Composite a chain of fragments from front to back over a background.
///
/// Each fragment adds its additive colour scaled by the transmittance
/// accumulated in front of it, then scales the transmittance by its
/// multiplicative colour. Compositing stops at the first opaque fragment,
/// which hides the background. Between a fragment entering a material and the
/// fragment leaving it, the material's transmittance over the depth travelled
/// is applied as well.
///
/// * `head`       - First fragment of the chain.
/// * `background` - Colour seen when the chain does not end opaque.
pub fn composite(head: Option<&Fragment>, background: Spectrum) -> Spectrum {
    let cutoff = head.map_or(INFINITY, |h| h.opaque_depth());
    let mut color = Spectrum::ZERO;
    let mut transmittance = Spectrum::ONE;
    let mut medium: Option<(&ArcMaterial, Float)> = None;

    for fragment in FragmentIter::new(head) {
        if fragment.depth() > cutoff {
            break;
        }
        if let Some((material, start)) = medium {
            transmittance *= material.transmittance(fragment.depth() - start);
            medium = Some((material, fragment.depth()));
        }

        color += transmittance * fragment.additive_color();
        if fragment.is_opaque() {
            return color;
        }
        transmittance *= fragment.multiplicative_color();
        if transmittance.is_black() {
            return color;
        }

        if let Some(material) = fragment.material() {
            if fragment.is_entering() {
                medium = Some((material, fragment.depth()));
            } else if medium.is_some_and(|(current, _)| Arc::ptr_eq(current, material)) {
                medium = None;
            }
        }
    }
    color + transmittance * background
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::*;

    fn chain(fragments: Vec<Fragment>) -> Option<Box<Fragment>> {
        fragments.into_iter().fold(None, |head, f| match head {
            None => Some(Box::new(f)),
            Some(head) => Some(head.insert_next_fragment(Box::new(f))),
        })
    }

    fn depths(head: &Option<Box<Fragment>>) -> Vec<Float> {
        FragmentIter::new(head.as_deref()).map(|f| f.depth()).collect()
    }

    fn gray(v: Float) -> Spectrum {
        Spectrum::new(v)
    }

    #[test]
    fn insert_keeps_depth_order() {
        let head = chain(vec![
            Fragment::transparent(gray(0.1), gray(0.5), 3.0),
            Fragment::transparent(gray(0.1), gray(0.5), 1.0),
            Fragment::transparent(gray(0.1), gray(0.5), 2.0),
            Fragment::transparent(gray(0.1), gray(0.5), 4.0),
        ]);
        assert_eq!(depths(&head), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn equal_depths_keep_insertion_order() {
        let head = chain(vec![
            Fragment::transparent(gray(0.1), gray(0.5), 2.0),
            Fragment::transparent(gray(0.2), gray(0.5), 2.0),
            Fragment::transparent(gray(0.3), gray(0.5), 1.0),
            Fragment::transparent(gray(0.4), gray(0.5), 2.0),
        ]);
        let adds: Vec<Float> = FragmentIter::new(head.as_deref())
            .map(|f| f.additive_color().red())
            .collect();
        assert_eq!(adds, vec![0.3, 0.1, 0.2, 0.4]);
    }

    #[test]
    fn opaque_front_drops_fragments_behind() {
        let head = chain(vec![
            Fragment::transparent(gray(0.1), gray(0.5), 5.0),
            Fragment::opaque(gray(1.0), 3.0),
            Fragment::transparent(gray(0.1), gray(0.5), 4.0),
            Fragment::transparent(gray(0.1), gray(0.5), 1.0),
        ]);
        assert_eq!(depths(&head), vec![1.0, 3.0]);
        let head = head.unwrap();
        assert_eq!(head.opaque_depth(), 3.0);
        assert!(head.next_fragment().unwrap().is_opaque());
    }

    #[test]
    fn nearer_opaque_replaces_farther_one() {
        let head = chain(vec![Fragment::opaque(gray(0.2), 5.0), Fragment::opaque(gray(0.7), 2.0)]);
        assert_eq!(depths(&head), vec![2.0]);
        assert_eq!(composite(head.as_deref(), gray(0.0)), gray(0.7));
    }

    #[test]
    fn empty_chain_shows_background() {
        assert_eq!(composite(None, gray(0.25)), gray(0.25));
    }

    #[test]
    fn all_transparent_chain_reaches_background() {
        let head = chain(vec![
            Fragment::transparent(gray(0.1), gray(0.5), 1.0),
            Fragment::transparent(gray(0.2), gray(0.5), 2.0),
        ]);
        // 0.1 + 0.5 * (0.2 + 0.5 * 1.0)
        let c = composite(head.as_deref(), gray(1.0));
        assert!(approx_eq!(Float, c.red(), 0.45, epsilon = 0.00001));
    }

    #[test]
    fn material_attenuates_between_entry_and_exit() {
        let glass: ArcMaterial = Arc::new(UniformMaterial::new("glass", gray(1.0)));
        let head = chain(vec![
            Fragment::transparent(gray(0.0), gray(1.0), 1.0).with_material(glass.clone(), true),
            Fragment::transparent(gray(0.0), gray(1.0), 3.0).with_material(glass, false),
        ]);
        let c = composite(head.as_deref(), gray(1.0));
        assert!(approx_eq!(Float, c.red(), (-2.0f32).exp(), epsilon = 0.00001));
    }

    #[test]
    fn long_chain_drops_without_overflow() {
        let mut head = Box::new(Fragment::transparent(gray(0.0), gray(1.0), 0.0));
        let mut tail: &mut Fragment = &mut head;
        for i in 1..200_000 {
            tail.next = Some(Box::new(Fragment::transparent(gray(0.0), gray(1.0), i as Float)));
            tail = tail.next.as_deref_mut().unwrap();
        }
        drop(head);
    }
}
