use serde::Serialize;

use crate::render::flat_buffer::{FlatRenderBuffer, Rgba};
use crate::render::hit_test::RoleColors;
use crate::scene::camera::Camera;
use crate::scene::entity::{Animated, Entity, EntityKind, FlatRenderable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    Selectable,
    Draggable,
    Scenery,
}

/// What an external presentation renderer needs for one entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityView {
    pub kind: EntityKind,
    pub role: Role,
    pub index: usize,
    pub position: [f32; 3],
    pub yaw: f32,
    pub scale: f32,
    pub selected: bool,
    pub color: Rgba,
}

/// The three role lists of a trial. Index 0 of `selectable` is the current target.
#[derive(Debug, Clone, Default)]
pub struct RoleLists {
    pub selectable: Vec<Entity>,
    pub draggable: Vec<Entity>,
    pub scenery: Vec<Entity>,
}

impl RoleLists {
    pub fn target(&self) -> Option<&Entity> {
        self.selectable.first()
    }

    pub fn target_mut(&mut self) -> Option<&mut Entity> {
        self.selectable.first_mut()
    }

    pub fn len(&self) -> usize {
        self.selectable.len() + self.draggable.len() + self.scenery.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn advance(&mut self, dt: f32) {
        for entity in self
            .selectable
            .iter_mut()
            .chain(self.draggable.iter_mut())
            .chain(self.scenery.iter_mut())
        {
            entity.advance(dt);
        }
    }

    /// Clears the buffer and draws every entity in its role color.
    pub fn render_flat(&self, camera: &Camera, buffer: &mut FlatRenderBuffer, colors: &RoleColors) {
        buffer.clear(colors.background);
        for (i, entity) in self.selectable.iter().enumerate() {
            let color = if i == 0 { colors.selection } else { colors.other };
            entity.draw_flat(camera, buffer, color);
        }
        for (i, entity) in self.draggable.iter().enumerate() {
            let color = if i == 0 { colors.drag } else { colors.other };
            entity.draw_flat(camera, buffer, color);
        }
        for entity in &self.scenery {
            entity.draw_flat(camera, buffer, colors.scenery);
        }
    }

    pub fn views(&self) -> Vec<EntityView> {
        let lists: [(Role, &Vec<Entity>); 3] = [
            (Role::Selectable, &self.selectable),
            (Role::Draggable, &self.draggable),
            (Role::Scenery, &self.scenery),
        ];
        lists
            .into_iter()
            .flat_map(|(role, entities)| {
                entities.iter().enumerate().map(move |(index, entity)| EntityView {
                    kind: entity.kind,
                    role,
                    index,
                    position: entity.position.to_array(),
                    yaw: entity.yaw,
                    scale: entity.scale,
                    selected: entity.selected,
                    color: entity.display_color(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::Viewport;
    use crate::render::flat_buffer::BufferSize;
    use crate::scene::entity::RenderState;
    use glam::Vec3;

    fn camera() -> Camera {
        Camera::new(Vec3::ZERO, 0.0, Viewport::default())
    }

    #[test]
    fn only_first_selectable_gets_selection_color() {
        let mut roles = RoleLists::default();
        roles
            .selectable
            .push(Entity::new(EntityKind::Warlock, Vec3::new(-30.0, 0.0, 100.0), 2.0));
        roles
            .selectable
            .push(Entity::new(EntityKind::Warlock, Vec3::new(30.0, 0.0, 100.0), 2.0));
        roles
            .draggable
            .push(Entity::new(EntityKind::Lock, Vec3::new(0.0, 30.0, 100.0), 6.0));

        let mut buffer = FlatRenderBuffer::new(BufferSize::new(1280, 720), Rgba::BLACK);
        let colors = RoleColors::default();
        roles.render_flat(&camera(), &mut buffer, &colors);

        let first = camera().project(roles.selectable[0].position).expect("visible");
        let second = camera().project(roles.selectable[1].position).expect("visible");
        let lock = camera().project(roles.draggable[0].position).expect("visible");
        assert_eq!(buffer.pixel(first.x as u32, first.y as u32), Some(colors.selection));
        assert_eq!(buffer.pixel(second.x as u32, second.y as u32), Some(colors.other));
        assert_eq!(buffer.pixel(lock.x as u32, lock.y as u32), Some(colors.drag));
        assert_eq!(buffer.pixel(2, 2), Some(colors.background));
    }

    #[test]
    fn nearer_scenery_occludes_target() {
        let mut roles = RoleLists::default();
        roles
            .selectable
            .push(Entity::new(EntityKind::Ghost, Vec3::new(0.0, 0.0, 200.0), 5.0));
        roles
            .scenery
            .push(Entity::new(EntityKind::Table, Vec3::new(0.0, 0.0, 50.0), 3.0));

        let mut buffer = FlatRenderBuffer::new(BufferSize::new(1280, 720), Rgba::BLACK);
        let colors = RoleColors::default();
        roles.render_flat(&camera(), &mut buffer, &colors);
        assert_eq!(buffer.pixel(640, 360), Some(colors.scenery));
    }

    #[test]
    fn views_report_roles_and_resolved_colors() {
        let mut roles = RoleLists::default();
        let mut firefly = Entity::firefly(Vec3::ZERO, 0.0).with_render(RenderState {
            standard: Some(Rgba::LIME),
            selected: Some(Rgba::RED),
        });
        firefly.selected = true;
        roles.selectable.push(firefly);
        roles.scenery.push(Entity::new(EntityKind::Door, Vec3::ONE, 10.0));

        let views = roles.views();
        assert_eq!(views.len(), 2);
        assert_eq!(views[0].role, Role::Selectable);
        assert_eq!(views[0].color, Rgba::RED);
        assert_eq!(views[1].role, Role::Scenery);
        assert_eq!(views[1].color, Rgba::WHITE);
    }
}
