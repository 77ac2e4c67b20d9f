// sv_world.rs — entity link records and box queries

use skirmish_common::q_shared::*;

/// A linked entity's world-space bounds.
#[derive(Debug, Clone, Copy)]
pub struct EntityLink {
    pub abs_mins: Vec3,
    pub abs_maxs: Vec3,
}

/// Tracks which entities are linked into the world and where. Queries
/// return indices in ascending order so downstream iteration is
/// deterministic.
#[derive(Debug, Clone, Default)]
pub struct World {
    links: Vec<Option<EntityLink>>,
}

impl World {
    pub fn new() -> Self {
        Self { links: Vec::new() }
    }

    pub fn clear(&mut self) {
        self.links.clear();
    }

    pub fn link_entity(&mut self, ent_idx: usize, abs_mins: &Vec3, abs_maxs: &Vec3) {
        if ent_idx >= MAX_EDICTS {
            return;
        }
        if ent_idx >= self.links.len() {
            self.links.resize(ent_idx + 1, None);
        }
        self.links[ent_idx] = Some(EntityLink {
            abs_mins: *abs_mins,
            abs_maxs: *abs_maxs,
        });
    }

    pub fn unlink_entity(&mut self, ent_idx: usize) {
        if let Some(slot) = self.links.get_mut(ent_idx) {
            *slot = None;
        }
    }

    pub fn is_linked(&self, ent_idx: usize) -> bool {
        matches!(self.links.get(ent_idx), Some(Some(_)))
    }

    /// All linked entities whose bounds overlap the given box, ascending.
    pub fn box_entities(&self, mins: &Vec3, maxs: &Vec3) -> Vec<usize> {
        self.links
            .iter()
            .enumerate()
            .filter_map(|(idx, link)| {
                let link = link.as_ref()?;
                for i in 0..3 {
                    if link.abs_mins[i] > maxs[i] || link.abs_maxs[i] < mins[i] {
                        return None;
                    }
                }
                Some(idx)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_entities_ascending_order() {
        let mut world = World::new();
        world.link_entity(7, &[0.0, 0.0, 0.0], &[16.0, 16.0, 16.0]);
        world.link_entity(3, &[8.0, 8.0, 0.0], &[24.0, 24.0, 16.0]);
        world.link_entity(5, &[100.0, 100.0, 0.0], &[116.0, 116.0, 16.0]);

        let hits = world.box_entities(&[0.0, 0.0, 0.0], &[32.0, 32.0, 32.0]);
        assert_eq!(hits, vec![3, 7]);
    }

    #[test]
    fn test_touching_bounds_count_as_overlap() {
        let mut world = World::new();
        world.link_entity(1, &[0.0, 0.0, 0.0], &[16.0, 16.0, 16.0]);
        let hits = world.box_entities(&[16.0, 0.0, 0.0], &[32.0, 16.0, 16.0]);
        assert_eq!(hits, vec![1]);
    }

    #[test]
    fn test_unlink_removes_from_queries() {
        let mut world = World::new();
        world.link_entity(2, &[0.0, 0.0, 0.0], &[8.0, 8.0, 8.0]);
        assert!(world.is_linked(2));

        world.unlink_entity(2);
        assert!(!world.is_linked(2));
        assert!(world
            .box_entities(&[-64.0, -64.0, -64.0], &[64.0, 64.0, 64.0])
            .is_empty());
    }

    #[test]
    fn test_relink_replaces_bounds() {
        let mut world = World::new();
        world.link_entity(4, &[0.0, 0.0, 0.0], &[8.0, 8.0, 8.0]);
        world.link_entity(4, &[200.0, 200.0, 0.0], &[208.0, 208.0, 8.0]);

        assert!(world
            .box_entities(&[0.0, 0.0, 0.0], &[16.0, 16.0, 16.0])
            .is_empty());
        assert_eq!(
            world.box_entities(&[190.0, 190.0, 0.0], &[210.0, 210.0, 8.0]),
            vec![4]
        );
    }
}
