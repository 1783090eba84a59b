//! Demo scene

use lights::*;
use rtcore::common::*;
use rtcore::fragment::*;
use rtcore::geometry::*;
use rtcore::light::*;
use rtcore::material::*;
use rtcore::object::*;
use rtcore::spectrum::*;
use std::sync::Arc;

/// Near plane distance. Triangles with a vertex closer than this are skipped.
const NEAR: Float = 0.1;

/// Pinhole camera looking down its placement's `+z` axis.
pub struct Camera {
    /// Placement.
    coords: CoordinateSystem,

    /// Focal length in pixels.
    focal: Float,

    /// Image width.
    width: usize,

    /// Image height.
    height: usize,
}

impl Camera {
    /// Returns a new `Camera`.
    ///
    /// * `coords` - Placement.
    /// * `fov`    - Vertical field of view in degrees.
    /// * `width`  - Image width.
    /// * `height` - Image height.
    pub fn new(coords: CoordinateSystem, fov: Float, width: usize, height: usize) -> Self {
        let focal = 0.5 * height as Float / (0.5 * radians(fov)).tan();
        Self {
            coords,
            focal,
            width,
            height,
        }
    }

    /// Returns the camera position.
    pub fn position(&self) -> Point3f {
        self.coords.origin()
    }

    /// Returns the image width.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Project a world space point to screen coordinates with camera depth in
    /// `z`. Returns `None` for points closer than the near plane.
    ///
    /// * `p` - Point in world space.
    pub fn project(&self, p: &Point3f) -> Option<Point3f> {
        let local = self.coords.to_local_point(p);
        if local.z < NEAR {
            return None;
        }
        Some(Point3f::new(
            0.5 * self.width as Float + self.focal * local.x / local.z,
            0.5 * self.height as Float - self.focal * local.y / local.z,
            local.z,
        ))
    }
}

/// How a surface looks from outside.
#[derive(Clone)]
pub struct Surface {
    /// Diffuse reflectance.
    pub diffuse: Spectrum,

    /// Fraction of light passing through; black for opaque surfaces.
    pub transmission: Spectrum,
}

impl Surface {
    /// Returns an opaque surface.
    ///
    /// * `diffuse` - Diffuse reflectance.
    pub fn opaque(diffuse: Spectrum) -> Self {
        Self {
            diffuse,
            transmission: Spectrum::ZERO,
        }
    }

    /// Returns a translucent surface.
    ///
    /// * `diffuse`      - Diffuse reflectance.
    /// * `transmission` - Fraction of light passing through.
    pub fn translucent(diffuse: Spectrum, transmission: Spectrum) -> Self {
        Self {
            diffuse,
            transmission: transmission.clamp(0.0, 1.0),
        }
    }

    /// Returns the fragment this surface contributes at one pixel.
    ///
    /// * `shaded`   - Shaded surface colour.
    /// * `depth`    - Camera depth.
    /// * `material` - Material filling the object.
    /// * `entering` - True for faces pointing at the camera.
    pub fn fragment(&self, shaded: Spectrum, depth: Float, material: Option<&ArcMaterial>, entering: bool) -> Fragment {
        if self.transmission.is_black() {
            return Fragment::opaque(shaded, depth);
        }
        let coverage = 1.0 - self.transmission.average();
        let fragment = Fragment::transparent(shaded * coverage, self.transmission, depth);
        match material {
            Some(m) => fragment.with_material(Arc::clone(m), entering),
            None => fragment,
        }
    }
}

/// An object with its surface appearance.
pub struct SceneObject {
    /// The object.
    pub object: Arc<RTObject>,

    /// Surface appearance.
    pub surface: Surface,
}

/// Everything the renderer draws.
pub struct Scene {
    /// The camera.
    pub camera: Camera,

    /// Lights.
    pub lights: Vec<Arc<RTLight>>,

    /// Objects.
    pub objects: Vec<SceneObject>,

    /// World bounds of all objects.
    pub bounds: Bounds3f,

    /// Colour behind everything.
    pub background: Spectrum,
}

/// Returns a quad with corners `p0..p3` in counter-clockwise order seen from
/// the side it faces.
fn quad(p0: Point3f, p1: Point3f, p2: Point3f, p3: Point3f) -> TriangleMesh {
    TriangleMesh::new(vec![p0, p1, p2, p3], vec![[0, 1, 2], [0, 2, 3]], vec![])
}

/// Returns an axis aligned box centred at the origin with outward facing
/// triangles.
///
/// * `half` - Half extents.
fn cuboid(half: Vector3f) -> TriangleMesh {
    let (x, y, z) = (half.x, half.y, half.z);
    let vertices = vec![
        Point3f::new(-x, -y, -z),
        Point3f::new(x, -y, -z),
        Point3f::new(x, y, -z),
        Point3f::new(-x, y, -z),
        Point3f::new(-x, -y, z),
        Point3f::new(x, -y, z),
        Point3f::new(x, y, z),
        Point3f::new(-x, y, z),
    ];
    let triangles = vec![
        [0, 2, 1],
        [0, 3, 2],
        [4, 5, 6],
        [4, 6, 7],
        [0, 1, 5],
        [0, 5, 4],
        [3, 7, 6],
        [3, 6, 2],
        [0, 4, 7],
        [0, 7, 3],
        [1, 2, 6],
        [1, 6, 5],
    ];
    TriangleMesh::new(vertices, triangles, vec![])
}

/// Build the demo scene: a floor and back wall, an opaque triangle, a
/// translucent absorbing box, an emissive ceiling panel and three lights.
///
/// * `width`  - Image width.
/// * `height` - Image height.
pub fn demo_scene(width: usize, height: usize) -> Scene {
    let camera = Camera::new(
        CoordinateSystem::new(
            Point3f::new(0.0, 1.0, -4.0),
            Vector3f::new(0.0, -0.15, 1.0),
            Vector3f::new(0.0, 1.0, 0.0),
        ),
        50.0,
        width,
        height,
    );

    let origin = CoordinateSystem::default();
    let floor = quad(
        Point3f::new(-5.0, -1.0, -2.0),
        Point3f::new(-5.0, -1.0, 10.0),
        Point3f::new(5.0, -1.0, 10.0),
        Point3f::new(5.0, -1.0, -2.0),
    );
    let wall = quad(
        Point3f::new(-5.0, -1.0, 10.0),
        Point3f::new(-5.0, 5.0, 10.0),
        Point3f::new(5.0, 5.0, 10.0),
        Point3f::new(5.0, -1.0, 10.0),
    );
    let panel = quad(
        Point3f::new(-1.0, 0.0, -1.0),
        Point3f::new(1.0, 0.0, -1.0),
        Point3f::new(1.0, 0.0, 1.0),
        Point3f::new(-1.0, 0.0, 1.0),
    );
    let shard = TriangleMesh::new(
        vec![
            Point3f::new(-3.0, -1.0, 6.0),
            Point3f::new(-1.0, -1.0, 7.0),
            Point3f::new(-2.2, 2.0, 6.5),
        ],
        vec![[0, 2, 1]],
        vec![],
    );

    let glass: ArcMaterial = Arc::new(UniformMaterial::new("glass", Spectrum::from_rgb(0.6, 0.25, 0.05)));

    let objects = vec![
        SceneObject {
            object: Arc::new(RTObject::new("floor", floor, origin)),
            surface: Surface::opaque(Spectrum::from_rgb(0.6, 0.6, 0.55)),
        },
        SceneObject {
            object: Arc::new(RTObject::new("wall", wall, origin)),
            surface: Surface::opaque(Spectrum::from_rgb(0.5, 0.55, 0.6)),
        },
        SceneObject {
            object: Arc::new(RTObject::new("shard", shard, origin)),
            surface: Surface::opaque(Spectrum::from_rgb(0.8, 0.15, 0.1)),
        },
        SceneObject {
            object: Arc::new(
                RTObject::new(
                    "glass box",
                    cuboid(Vector3f::new(0.8, 0.8, 0.8)),
                    CoordinateSystem::new(
                        Point3f::new(1.2, -0.2, 4.5),
                        Vector3f::new(0.5, 0.0, 1.0),
                        Vector3f::new(0.0, 1.0, 0.0),
                    ),
                )
                .with_material(Arc::clone(&glass)),
            ),
            surface: Surface::translucent(Spectrum::new(0.1), Spectrum::new(0.9)),
        },
        SceneObject {
            object: Arc::new(
                RTObject::new("ceiling panel", panel, CoordinateSystem::at(Point3f::new(0.0, 4.5, 5.0)))
                    .with_emission(Spectrum::from_rgb(1.0, 0.95, 0.85), 4.0),
            ),
            surface: Surface::opaque(Spectrum::ONE),
        },
    ];

    let lights: Vec<Arc<RTLight>> = vec![
        Arc::new(RTLight::new(
            Arc::new(PointLight::new(Spectrum::from_rgb(1.0, 0.9, 0.8), 12.0, 0.3)),
            CoordinateSystem::at(Point3f::new(-2.0, 3.5, 2.0)),
        )),
        Arc::new(RTLight::new(
            Arc::new(SpotLight::new(Spectrum::from_rgb(0.7, 0.8, 1.0), 20.0, 0.1, 35.0, 4.0)),
            CoordinateSystem::new(
                Point3f::new(3.0, 4.0, 3.0),
                Vector3f::new(-0.4, -1.0, 0.6),
                Vector3f::new(0.0, 0.0, 1.0),
            ),
        )),
        Arc::new(RTLight::new(
            Arc::new(DirectionalLight::new(Spectrum::from_rgb(1.0, 0.95, 0.9), 0.4, 0.5)),
            CoordinateSystem::new(
                Point3f::zero(),
                Vector3f::new(0.3, -1.0, 0.5),
                Vector3f::new(0.0, 0.0, 1.0),
            ),
        )),
    ];

    let bounds = objects
        .iter()
        .fold(Bounds3f::default(), |b, o| b.union(&o.object.world_bounds()));

    Scene {
        camera,
        lights,
        objects,
        bounds,
        background: Spectrum::from_rgb(0.05, 0.05, 0.08),
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::*;

    #[test]
    fn camera_projects_centre_of_view() {
        let camera = Camera::new(CoordinateSystem::default(), 90.0, 100, 50);
        let p = camera.project(&Point3f::new(0.0, 0.0, 5.0)).unwrap();
        assert!(approx_eq!(Float, p.x, 50.0, epsilon = 0.001));
        assert!(approx_eq!(Float, p.y, 25.0, epsilon = 0.001));
        assert!(approx_eq!(Float, p.z, 5.0, epsilon = 0.001));
        assert!(camera.project(&Point3f::new(0.0, 0.0, -1.0)).is_none());
    }

    #[test]
    fn cuboid_faces_point_outwards() {
        let mesh = cuboid(Vector3f::new(1.0, 1.0, 1.0));
        for tri in 0..mesh.triangles.len() {
            let [p0, p1, p2] = mesh.triangle_vertices(tri);
            let centroid = Vector3f::from(p0) + Vector3f::from(p1) + Vector3f::from(p2);
            assert!(mesh.face_normal(tri).dot(&centroid) > 0.0, "triangle {}", tri);
        }
    }

    #[test]
    fn emissive_panel_faces_down() {
        let scene = demo_scene(8, 8);
        let panel = scene
            .objects
            .iter()
            .find(|o| o.object.is_emissive())
            .unwrap();
        let mesh = panel.object.world_mesh();
        for tri in 0..mesh.triangles.len() {
            assert!(mesh.face_normal(tri).y < 0.0);
        }
    }

    #[test]
    fn translucent_fragments_carry_material() {
        let glass: ArcMaterial = Arc::new(UniformMaterial::new("glass", Spectrum::ONE));
        let surface = Surface::translucent(Spectrum::ONE, Spectrum::new(0.75));
        let f = surface.fragment(Spectrum::ONE, 2.0, Some(&glass), true);
        assert!(!f.is_opaque());
        assert!(f.is_entering());
        assert!(f.material().is_some());
        assert_eq!(f.additive_color(), Spectrum::new(0.25));

        let opaque = Surface::opaque(Spectrum::ONE).fragment(Spectrum::ONE, 2.0, Some(&glass), true);
        assert!(opaque.is_opaque());
    }
}
