//! Selection resolver
//!
//! Maps a 2D cursor to world space: the block under the cursor, the 3D point
//! it touches, and points on the drag planes. Picking casts a ray against
//! block bounding boxes, so no GPU read-back is involved.

use glam::{Mat4, Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use super::camera::OrbitCamera;
use super::physics::{BlockPose, TowerPhysics};

/// Tag of pixels where nothing was drawn
pub const BACKGROUND_TAG: u32 = 0;
/// Tag of the ground plane
pub const GROUND_TAG: u32 = 1;
/// First block tag; block `i` is tagged `FIRST_BLOCK_TAG + i`
pub const FIRST_BLOCK_TAG: u32 = 2;

/// Object tag a renderer writes for block `index`
#[inline]
pub fn tag_for_block(index: usize) -> u32 {
    FIRST_BLOCK_TAG + index as u32
}

/// Block index for an object tag, if the tag names one of `block_count` blocks
#[inline]
pub fn block_from_tag(tag: u32, block_count: usize) -> Option<usize> {
    let index = tag.checked_sub(FIRST_BLOCK_TAG)? as usize;
    (index < block_count).then_some(index)
}

/// Window size in pixels; cursor origin is the top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Strictly inside the window; edge pixels count as outside
    pub fn contains(&self, cursor: Vec2) -> bool {
        cursor.x > 0.0 && cursor.y > 0.0 && cursor.x < self.width && cursor.y < self.height
    }

    pub fn aspect(&self) -> f32 {
        if self.height > 0.0 {
            self.width / self.height
        } else {
            1.0
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(800.0, 600.0)
    }
}

/// A half-line in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Unit direction
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Option<Self> {
        let direction = direction.try_normalize()?;
        Some(Self { origin, direction })
    }

    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Distance along the ray to a plane, if the plane lies ahead
    pub fn intersect_plane(&self, point: Vec3, normal: Vec3) -> Option<f32> {
        let denom = self.direction.dot(normal);
        if denom.abs() < 1e-6 {
            return None;
        }
        let t = (point - self.origin).dot(normal) / denom;
        (t >= 0.0).then_some(t)
    }

    /// Distance along the ray to the horizontal plane `y = height`
    pub fn intersect_horizontal(&self, height: f32) -> Option<f32> {
        self.intersect_plane(Vec3::new(0.0, height, 0.0), Vec3::Y)
    }

    /// Distance to an oriented box, via the slab test in box space.
    /// A ray starting inside the box hits at 0.
    pub fn intersect_obb(&self, pose: &BlockPose, half_extents: Vec3) -> Option<f32> {
        let origin = pose.to_local(self.origin);
        let direction = pose.rotation.inverse() * self.direction;

        let mut t_min = 0.0f32;
        let mut t_max = f32::INFINITY;
        for axis in 0..3 {
            let o = origin[axis];
            let d = direction[axis];
            let h = half_extents[axis];
            if d.abs() < 1e-8 {
                if o < -h || o > h {
                    return None;
                }
                continue;
            }
            let mut t0 = (-h - o) / d;
            let mut t1 = (h - o) / d;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_min > t_max {
                return None;
            }
        }
        Some(t_min)
    }
}

/// Window coordinates (y down from the top, depth in `[0, 1]`) to world space.
///
/// `None` for cursors outside the viewport and for singular transforms.
pub fn unproject(
    cursor: Vec2,
    depth: f32,
    view: Mat4,
    projection: Mat4,
    viewport: Viewport,
) -> Option<Vec3> {
    if !viewport.contains(cursor) {
        return None;
    }
    let clip_from_world = projection * view;
    if clip_from_world.determinant().abs() < f32::EPSILON {
        return None;
    }
    let world_from_clip = clip_from_world.inverse();

    // Window y runs down, GL window y runs up
    let gl_y = viewport.height - cursor.y;
    let ndc = Vec4::new(
        2.0 * cursor.x / viewport.width - 1.0,
        2.0 * gl_y / viewport.height - 1.0,
        2.0 * depth - 1.0,
        1.0,
    );
    let world = world_from_clip * ndc;
    if world.w.abs() < f32::EPSILON {
        return None;
    }
    Some(world.truncate() / world.w)
}

/// World space to window coordinates and depth; the inverse of [`unproject`].
///
/// `None` for points behind the eye.
pub fn project(world: Vec3, view: Mat4, projection: Mat4, viewport: Viewport) -> Option<(Vec2, f32)> {
    let clip = projection * view * world.extend(1.0);
    if clip.w <= f32::EPSILON {
        return None;
    }
    let ndc = clip.truncate() / clip.w;
    let cursor = Vec2::new(
        (ndc.x + 1.0) * 0.5 * viewport.width,
        viewport.height - (ndc.y + 1.0) * 0.5 * viewport.height,
    );
    Some((cursor, (ndc.z + 1.0) * 0.5))
}

/// Ray from the near plane through the cursor to the far plane
pub fn cursor_ray(cursor: Vec2, view: Mat4, projection: Mat4, viewport: Viewport) -> Option<Ray> {
    let near = unproject(cursor, 0.0, view, projection, viewport)?;
    let far = unproject(cursor, 1.0, view, projection, viewport)?;
    Ray::new(near, far - near)
}

/// What a pick ray hit first
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickHit {
    pub point: Vec3,
    /// Object tag of the hit object
    pub tag: u32,
}

impl PickHit {
    pub fn block(&self, block_count: usize) -> Option<usize> {
        block_from_tag(self.tag, block_count)
    }
}

/// Scene-picking service: nearest object along a ray
pub trait Picker {
    fn pick(&self, ray: &Ray, physics: &dyn TowerPhysics) -> Option<PickHit>;
}

/// Picks against each block's oriented bounding box and the ground plane
#[derive(Debug, Clone, Copy, Default)]
pub struct BoundsPicker;

impl Picker for BoundsPicker {
    fn pick(&self, ray: &Ray, physics: &dyn TowerPhysics) -> Option<PickHit> {
        let mut best: Option<(f32, u32)> = ray
            .intersect_horizontal(physics.ground_height())
            .map(|t| (t, GROUND_TAG));

        for index in 0..physics.block_count() {
            let Some(pose) = physics.pose(index) else {
                continue;
            };
            let Some(t) = ray.intersect_obb(&pose, physics.half_extents(index)) else {
                continue;
            };
            if best.is_none_or(|(nearest, _)| t < nearest) {
                best = Some((t, tag_for_block(index)));
            }
        }

        best.map(|(t, tag)| PickHit {
            point: ray.at(t),
            tag,
        })
    }
}

/// Result of resolving the cursor against the scene
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Resolution {
    /// Block under the cursor
    pub hovered: Option<usize>,
    /// World point under the cursor, `None` over the background
    pub point: Option<Vec3>,
}

/// Cursor-to-world resolution for the current camera
#[derive(Debug, Clone)]
pub struct SelectionResolver<P: Picker = BoundsPicker> {
    pub viewport: Viewport,
    picker: P,
}

impl SelectionResolver<BoundsPicker> {
    pub fn new(viewport: Viewport) -> Self {
        Self::with_picker(viewport, BoundsPicker)
    }
}

impl<P: Picker> SelectionResolver<P> {
    pub fn with_picker(viewport: Viewport, picker: P) -> Self {
        Self { viewport, picker }
    }

    pub fn picker_mut(&mut self) -> &mut P {
        &mut self.picker
    }

    pub fn ray(&self, cursor: Vec2, camera: &OrbitCamera) -> Option<Ray> {
        cursor_ray(
            cursor,
            camera.view_matrix(),
            camera.projection_matrix(self.viewport.aspect()),
            self.viewport,
        )
    }

    /// Block and point under the cursor; nothing when the cursor is absent or outside
    pub fn resolve(
        &self,
        cursor: Option<Vec2>,
        camera: &OrbitCamera,
        physics: &dyn TowerPhysics,
    ) -> Resolution {
        let Some(ray) = cursor.and_then(|c| self.ray(c, camera)) else {
            return Resolution::default();
        };
        match self.picker.pick(&ray, physics) {
            Some(hit) => Resolution {
                hovered: hit.block(physics.block_count()),
                point: Some(hit.point),
            },
            None => Resolution::default(),
        }
    }

    /// Cursor point on the horizontal plane `y = plane_height`, with x and z
    /// clamped to `±half_span`
    pub fn horizontal_point(
        &self,
        cursor: Vec2,
        camera: &OrbitCamera,
        plane_height: f32,
        half_span: f32,
    ) -> Option<Vec3> {
        let ray = self.ray(cursor, camera)?;
        let hit = ray.at(ray.intersect_horizontal(plane_height)?);
        Some(Vec3::new(
            hit.x.clamp(-half_span, half_span),
            plane_height,
            hit.z.clamp(-half_span, half_span),
        ))
    }

    /// Cursor point on the vertical plane through `origin` that faces the camera
    pub fn vertical_point(&self, cursor: Vec2, camera: &OrbitCamera, origin: Vec3) -> Option<Vec3> {
        let ray = self.ray(cursor, camera)?;
        let to_eye = camera.eye() - origin;
        let normal = Vec3::new(to_eye.x, 0.0, to_eye.z).try_normalize()?;
        Some(ray.at(ray.intersect_plane(origin, normal)?))
    }
}

impl Default for SelectionResolver<BoundsPicker> {
    fn default() -> Self {
        Self::new(Viewport::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::physics::canonical_pose;
    use glam::Quat;

    #[test]
    fn test_tags() {
        assert_eq!(block_from_tag(BACKGROUND_TAG, 54), None);
        assert_eq!(block_from_tag(GROUND_TAG, 54), None);
        assert_eq!(block_from_tag(2, 54), Some(0));
        assert_eq!(block_from_tag(55, 54), Some(53));
        assert_eq!(block_from_tag(56, 54), None);
        assert_eq!(block_from_tag(tag_for_block(7), 54), Some(7));
    }

    #[test]
    fn test_viewport_edges_are_outside() {
        let vp = Viewport::new(800.0, 600.0);
        assert!(vp.contains(Vec2::new(1.0, 1.0)));
        assert!(!vp.contains(Vec2::new(0.0, 300.0)));
        assert!(!vp.contains(Vec2::new(400.0, 0.0)));
        assert!(!vp.contains(Vec2::new(800.0, 300.0)));
        assert!(!vp.contains(Vec2::new(400.0, 600.0)));
    }

    #[test]
    fn test_unproject_round_trip() {
        let camera = OrbitCamera::default();
        let vp = Viewport::new(800.0, 600.0);
        let view = camera.view_matrix();
        let proj = camera.projection_matrix(vp.aspect());

        let world = Vec3::new(1.5, 12.0, -3.0);
        let (cursor, depth) = project(world, view, proj, vp).unwrap();
        assert!(vp.contains(cursor));

        let back = unproject(cursor, depth, view, proj, vp).unwrap();
        assert!((back - world).length() < 1e-2, "{back:?}");
    }

    #[test]
    fn test_unproject_outside_viewport() {
        let camera = OrbitCamera::default();
        let vp = Viewport::new(800.0, 600.0);
        let out = unproject(
            Vec2::new(-5.0, 100.0),
            0.5,
            camera.view_matrix(),
            camera.projection_matrix(vp.aspect()),
            vp,
        );
        assert_eq!(out, None);
    }

    #[test]
    fn test_ray_obb_hits_rotated_box() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::NEG_Z).unwrap();
        let pose = BlockPose::new(Vec3::ZERO, Quat::from_rotation_y(std::f32::consts::FRAC_PI_2));
        // Long axis now runs along z, so the near face is 3.75 away from centre
        let t = ray.intersect_obb(&pose, Vec3::new(3.75, 0.75, 1.25)).unwrap();
        assert!((t - 6.25).abs() < 1e-4);

        let miss = Ray::new(Vec3::new(0.0, 5.0, 10.0), Vec3::NEG_Z).unwrap();
        assert_eq!(miss.intersect_obb(&pose, Vec3::new(3.75, 0.75, 1.25)), None);
    }

    #[test]
    fn test_horizontal_intersection_behind_is_none() {
        let ray = Ray::new(Vec3::new(0.0, 5.0, 0.0), Vec3::Y).unwrap();
        assert_eq!(ray.intersect_horizontal(0.0), None);
        let down = Ray::new(Vec3::new(0.0, 5.0, 0.0), Vec3::NEG_Y).unwrap();
        assert_eq!(down.intersect_horizontal(1.0), Some(4.0));
    }

    #[test]
    fn test_horizontal_point_clamped() {
        let resolver = SelectionResolver::default();
        let camera = OrbitCamera::default();
        // Near the top edge the ray barely descends, so the plane hit lies far away
        let p = resolver
            .horizontal_point(Vec2::new(400.0, 250.0), &camera, 0.0, 30.0)
            .unwrap();
        assert_eq!(p.y, 0.0);
        assert!(p.x.abs() <= 30.0 && p.z.abs() <= 30.0);
    }

    #[test]
    fn test_vertical_point_lies_on_plane() {
        let resolver = SelectionResolver::default();
        let camera = OrbitCamera::default();
        let origin = Vec3::new(0.0, 10.0, 0.0);
        let p = resolver
            .vertical_point(Vec2::new(400.0, 300.0), &camera, origin)
            .unwrap();
        let to_eye = camera.eye() - origin;
        let normal = Vec3::new(to_eye.x, 0.0, to_eye.z).normalize();
        assert!((p - origin).dot(normal).abs() < 1e-3);
    }

    #[test]
    fn test_pick_takes_nearest_block() {
        use crate::sim::testing::ScriptedWorld;

        let world = ScriptedWorld::tower(54);
        // Straight down through the middle column of every layer
        let ray = Ray::new(Vec3::new(0.0, 100.0, 0.0), Vec3::NEG_Y).unwrap();
        let hit = BoundsPicker.pick(&ray, &world).unwrap();

        assert_eq!(hit.block(54), Some(52));
        let top = canonical_pose(52).position.y + world.half_extents(52).y;
        assert!((hit.point.y - top).abs() < 1e-3, "{:?}", hit.point);
    }

    #[test]
    fn test_pick_ground_beside_tower() {
        use crate::sim::testing::ScriptedWorld;

        let world = ScriptedWorld::tower(54);
        let ray = Ray::new(Vec3::new(30.0, 10.0, -20.0), Vec3::NEG_Y).unwrap();
        let hit = BoundsPicker.pick(&ray, &world).unwrap();

        assert_eq!(hit.tag, GROUND_TAG);
        assert_eq!(hit.block(54), None);
        assert!(hit.point.abs_diff_eq(Vec3::new(30.0, 0.0, -20.0), 1e-4));
    }

    #[test]
    fn test_resolve_against_tower() {
        use crate::sim::testing::ScriptedWorld;

        let world = ScriptedWorld::tower(54);
        let camera = OrbitCamera::default();
        let resolver = SelectionResolver::new(Viewport::new(640.0, 480.0));

        // Top edge of the view looks above the horizon
        assert_eq!(
            resolver.resolve(Some(Vec2::new(320.0, 1.0)), &camera, &world),
            Resolution::default()
        );

        // Bottom corner looks at open ground well to the side of the tower
        let ground = resolver.resolve(Some(Vec2::new(1.0, 479.0)), &camera, &world);
        assert_eq!(ground.hovered, None);
        let point = ground.point.unwrap();
        assert!(point.y.abs() < 1e-2, "{:?}", point);

        // The middle of the view looks at the tower
        let centre = resolver.resolve(Some(Vec2::new(320.0, 240.0)), &camera, &world);
        assert!(centre.hovered.is_some());

        assert_eq!(resolver.resolve(None, &camera, &world), Resolution::default());
        assert_eq!(
            resolver.resolve(Some(Vec2::new(-3.0, 240.0)), &camera, &world),
            Resolution::default()
        );
    }
}
