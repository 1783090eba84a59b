//! Fragment chains and frame buffers.

use super::node::*;
use crate::common::*;
use crate::spectrum::*;

/// The depth-ordered fragments covering one pixel.
#[derive(Debug, Default)]
pub struct FragmentChain {
    /// Nearest fragment.
    head: Option<Box<Fragment>>,
}

impl FragmentChain {
    /// Returns an empty chain.
    pub fn new() -> Self {
        Self { head: None }
    }

    /// Insert a fragment in depth order.
    ///
    /// * `fragment` - The fragment.
    pub fn insert(&mut self, fragment: Fragment) {
        let fragment = Box::new(fragment);
        self.head = Some(match self.head.take() {
            None => fragment,
            Some(head) => head.insert_next_fragment(fragment),
        });
    }

    /// Returns the nearest fragment.
    pub fn head(&self) -> Option<&Fragment> {
        self.head.as_deref()
    }

    /// Returns true if no fragment covers the pixel.
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Returns the number of fragments kept.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Returns an iterator from front to back.
    pub fn iter(&self) -> FragmentIter<'_> {
        FragmentIter::new(self.head())
    }

    /// Returns the depth of the nearest opaque fragment, or `INFINITY`.
    pub fn opaque_depth(&self) -> Float {
        self.head().map_or(INFINITY, |h| h.opaque_depth())
    }

    /// Composite the chain over a background colour.
    ///
    /// * `background` - Background colour.
    pub fn composite(&self, background: Spectrum) -> Spectrum {
        composite(self.head(), background)
    }

    /// Discard every fragment.
    pub fn clear(&mut self) {
        self.head = None;
    }
}

/// One fragment chain per pixel of an image.
#[derive(Debug)]
pub struct FrameBuffer {
    /// Width in pixels.
    width: usize,

    /// Height in pixels.
    height: usize,

    /// Chains in row-major order.
    chains: Vec<FragmentChain>,
}

impl FrameBuffer {
    /// Returns a new `FrameBuffer` with empty chains.
    ///
    /// * `width`  - Width in pixels.
    /// * `height` - Height in pixels.
    pub fn new(width: usize, height: usize) -> Self {
        let mut chains = Vec::with_capacity(width * height);
        chains.resize_with(width * height, FragmentChain::new);
        Self { width, height, chains }
    }

    /// Returns the width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Insert a fragment into a pixel's chain. Pixels outside the buffer are
    /// ignored.
    ///
    /// * `x`        - Column.
    /// * `y`        - Row.
    /// * `fragment` - The fragment.
    pub fn insert(&mut self, x: usize, y: usize, fragment: Fragment) {
        if x < self.width && y < self.height {
            self.chains[y * self.width + x].insert(fragment);
        }
    }

    /// Returns a pixel's chain.
    ///
    /// * `x` - Column.
    /// * `y` - Row.
    pub fn chain(&self, x: usize, y: usize) -> &FragmentChain {
        &self.chains[y * self.width + x]
    }

    /// Returns the quickest depth test available before creating a fragment:
    /// the depth beyond which nothing is visible at the pixel.
    ///
    /// * `x` - Column.
    /// * `y` - Row.
    pub fn opaque_depth(&self, x: usize, y: usize) -> Float {
        self.chain(x, y).opaque_depth()
    }

    /// Composite one row of pixels.
    ///
    /// * `y`          - Row.
    /// * `background` - Background colour.
    pub fn resolve_row(&self, y: usize, background: Spectrum) -> Vec<Spectrum> {
        self.chains[y * self.width..(y + 1) * self.width]
            .iter()
            .map(|chain| chain.composite(background))
            .collect()
    }

    /// Discard every fragment, keeping the buffer's size.
    pub fn clear(&mut self) {
        self.chains.iter_mut().for_each(FragmentChain::clear);
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// (depth, additive, multiplicative); multiplicative 0 means opaque.
    type Layer = (Float, Float, Float);

    fn build(layers: &[Layer]) -> FragmentChain {
        let mut chain = FragmentChain::new();
        for &(depth, add, mult) in layers {
            chain.insert(Fragment::transparent(Spectrum::new(add), Spectrum::new(mult), depth));
        }
        chain
    }

    fn visible(chain: &FragmentChain) -> Vec<Layer> {
        chain
            .iter()
            .map(|f| (f.depth(), f.additive_color().red(), f.multiplicative_color().red()))
            .collect()
    }

    /// Layers with distinct depths; roughly a quarter are opaque.
    fn layers() -> impl Strategy<Value = Vec<Layer>> {
        prop::collection::btree_set(0..1000u32, 1..12).prop_flat_map(|depths| {
            let n = depths.len();
            (
                Just(depths.into_iter().map(|d| d as Float * 0.5).collect::<Vec<_>>()),
                prop::collection::vec(0.0..1.0f32, n),
                prop::collection::vec(prop_oneof![3 => 0.05..1.0f32, 1 => Just(0.0f32)], n),
            )
                .prop_map(|(d, a, m)| {
                    d.into_iter()
                        .zip(a)
                        .zip(m)
                        .map(|((d, a), m)| (d, a, m))
                        .collect::<Vec<_>>()
                })
        })
    }

    #[test]
    fn frame_buffer_ignores_out_of_range_pixels() {
        let mut fb = FrameBuffer::new(2, 2);
        fb.insert(5, 0, Fragment::opaque(Spectrum::ONE, 1.0));
        fb.insert(1, 1, Fragment::opaque(Spectrum::ONE, 1.0));
        assert_eq!(fb.resolve_row(0, Spectrum::ZERO), vec![Spectrum::ZERO; 2]);
        assert_eq!(fb.resolve_row(1, Spectrum::ZERO), vec![Spectrum::ZERO, Spectrum::ONE]);
        assert_eq!(fb.opaque_depth(1, 1), 1.0);
        fb.clear();
        assert!(fb.chain(1, 1).is_empty());
    }

    proptest! {
        #[test]
        fn insertion_order_does_not_matter(
            (original, shuffled) in layers().prop_flat_map(|l| (Just(l.clone()), Just(l).prop_shuffle()))
        ) {
            let a = build(&original);
            let b = build(&shuffled);
            prop_assert_eq!(visible(&a), visible(&b));
            prop_assert_eq!(a.composite(Spectrum::new(0.3)), b.composite(Spectrum::new(0.3)));

            let depths: Vec<Float> = visible(&a).iter().map(|l| l.0).collect();
            let mut sorted = depths.clone();
            sorted.sort_by(|x, y| x.partial_cmp(y).unwrap());
            prop_assert_eq!(depths, sorted);
        }

        #[test]
        fn fragments_behind_opaque_do_not_change_color(
            front in layers(),
            opaque_add in 0.0..1.0f32,
            behind in prop::collection::vec((0.0..1.0f32, 0.0..1.0f32), 0..8),
        ) {
            let d = 600.0;
            let front: Vec<Layer> = front.into_iter().filter(|l| l.0 < d).collect();
            let mut with_opaque = front.clone();
            with_opaque.push((d, opaque_add, 0.0));

            let mut with_behind = with_opaque.clone();
            with_behind.extend(behind.iter().enumerate().map(|(i, &(a, m))| (d + 1.0 + i as Float, a, m)));

            let bg = Spectrum::new(0.7);
            prop_assert_eq!(build(&with_opaque).composite(bg), build(&with_behind).composite(bg));
        }
    }
}
