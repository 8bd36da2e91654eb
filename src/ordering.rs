//! Ordering engine – keeps section `order` values a contiguous permutation
//! of `0..n` under move/reorder/visibility mutations.

use crate::document::{SectionId, SectionKind, TemplateDocument};
use crate::error::{Error, Result};

impl TemplateDocument {
    /// Swap the section with its predecessor. Returns `false` when it is
    /// already first.
    pub fn move_section_up(&mut self, id: SectionId) -> Result<bool> {
        self.shift(id, -1)
    }

    /// Swap the section with its successor. Returns `false` when it is
    /// already last.
    pub fn move_section_down(&mut self, id: SectionId) -> Result<bool> {
        self.shift(id, 1)
    }

    fn shift(&mut self, id: SectionId, delta: isize) -> Result<bool> {
        let ids = self.ids_in_order();
        let pos = ids
            .iter()
            .position(|&s| s == id)
            .ok_or(Error::SectionNotFound(id))?;
        let target = pos as isize + delta;
        if target < 0 || target as usize >= ids.len() {
            return Ok(false);
        }
        let neighbour = ids[target as usize];

        let a = self.section(id)?.order;
        let b = self.section(neighbour)?.order;
        self.section_mut(id)?.order = b;
        self.section_mut(neighbour)?.order = a;
        self.touch();
        Ok(true)
    }

    /// Move a section to `new_index` in the sorted sequence, shifting the
    /// sections in between. Indices past the end clamp to the last slot.
    pub fn reorder(&mut self, id: SectionId, new_index: usize) -> Result<bool> {
        let mut ids = self.ids_in_order();
        let pos = ids
            .iter()
            .position(|&s| s == id)
            .ok_or(Error::SectionNotFound(id))?;
        let new_index = new_index.min(ids.len() - 1);
        if pos == new_index {
            return Ok(false);
        }
        let moved = ids.remove(pos);
        ids.insert(new_index, moved);
        self.assign_orders(&ids);
        self.touch();
        Ok(true)
    }

    /// Flip visibility. Order is untouched; a hidden section keeps its
    /// settings and simply drops out of the render plan.
    pub fn toggle_visibility(&mut self, id: SectionId) -> Result<bool> {
        let section = self.section_mut(id)?;
        section.visible = !section.visible;
        let visible = section.visible;
        self.touch();
        Ok(visible)
    }

    /// Rewrite `order` as `0..n` following the current relative order.
    /// Repairs documents loaded from stores with gaps or duplicates.
    pub fn normalize_order(&mut self) {
        let ids = self.ids_in_order();
        self.assign_orders(&ids);
    }

    /// Accept a document that arrived from outside: repair its order and
    /// reject it unless it has exactly one header.
    pub fn admit(mut self) -> Result<Self> {
        self.normalize_order();
        self.check_invariants()?;
        Ok(self)
    }

    /// Verify the ordering and header invariants.
    pub fn check_invariants(&self) -> Result<()> {
        let mut orders: Vec<usize> = self.sections.iter().map(|s| s.order).collect();
        orders.sort_unstable();
        if orders.iter().enumerate().any(|(i, &o)| i != o) {
            return Err(Error::Validation {
                field: "sections",
                message: format!("section order is not contiguous: {orders:?}"),
            });
        }
        let headers = self
            .sections
            .iter()
            .filter(|s| s.kind() == SectionKind::Header)
            .count();
        if headers != 1 {
            return Err(Error::Validation {
                field: "sections",
                message: format!("expected exactly one header section, found {headers}"),
            });
        }
        Ok(())
    }

    fn ids_in_order(&self) -> Vec<SectionId> {
        self.sorted_sections().iter().map(|s| s.id).collect()
    }

    fn assign_orders(&mut self, ids: &[SectionId]) {
        for (order, id) in ids.iter().enumerate() {
            if let Some(s) = self.sections.iter_mut().find(|s| s.id == *id) {
                s.order = order;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::document::{SectionKind, SequentialIds, TemplateDocument};

    fn doc() -> TemplateDocument {
        TemplateDocument::new("Ordered", &mut SequentialIds::default())
    }

    fn orders(d: &TemplateDocument) -> Vec<usize> {
        d.sections.iter().map(|s| s.order).collect()
    }

    fn kinds(d: &TemplateDocument) -> Vec<SectionKind> {
        d.sorted_sections().iter().map(|s| s.kind()).collect()
    }

    #[test]
    fn move_up_swaps_with_predecessor() {
        let mut d = doc();
        let skills = d.section_of_kind(SectionKind::Skills).unwrap().id;
        assert!(d.move_section_up(skills).unwrap());
        let k = kinds(&d);
        assert_eq!(k[3], SectionKind::Skills);
        assert_eq!(k[4], SectionKind::Education);
        d.check_invariants().unwrap();
    }

    #[test]
    fn edges_are_noops() {
        let mut d = doc();
        let first = d.sorted_sections()[0].id;
        let last = d.sorted_sections()[6].id;
        let stamp = d.updated_at;
        assert!(!d.move_section_up(first).unwrap());
        assert!(!d.move_section_down(last).unwrap());
        assert_eq!(d.updated_at, stamp);
    }

    #[test]
    fn toggle_keeps_order() {
        let mut d = doc();
        let summary = d.section_of_kind(SectionKind::Summary).unwrap().id;
        let order = d.section(summary).unwrap().order;
        assert!(!d.toggle_visibility(summary).unwrap());
        assert_eq!(d.section(summary).unwrap().order, order);
        assert!(d.toggle_visibility(summary).unwrap());
    }

    #[test]
    fn reorder_shifts_between() {
        let mut d = doc();
        let certs = d.section_of_kind(SectionKind::Certificates).unwrap().id;
        assert!(d.reorder(certs, 1).unwrap());
        let k = kinds(&d);
        assert_eq!(k[1], SectionKind::Certificates);
        assert_eq!(k[2], SectionKind::Summary);
        assert_eq!(k[6], SectionKind::Languages);
        d.check_invariants().unwrap();
    }

    #[test]
    fn random_walk_preserves_invariants() {
        let mut d = doc();
        let ids: Vec<_> = d.sections.iter().map(|s| s.id).collect();
        // Deterministic LCG so the walk is reproducible.
        let mut seed: u64 = 0x5eed;
        for _ in 0..500 {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let id = ids[(seed >> 33) as usize % ids.len()];
            match (seed >> 13) % 4 {
                0 => {
                    d.move_section_up(id).unwrap();
                }
                1 => {
                    d.move_section_down(id).unwrap();
                }
                2 => {
                    d.toggle_visibility(id).unwrap();
                }
                _ => {
                    d.reorder(id, ((seed >> 40) % 9) as usize).unwrap();
                }
            }
            d.check_invariants().unwrap();
        }
    }

    #[test]
    fn normalize_repairs_gaps() {
        let mut d = doc();
        for (i, s) in d.sections.iter_mut().enumerate() {
            s.order = i * 10;
        }
        assert!(d.check_invariants().is_err());
        d.normalize_order();
        d.check_invariants().unwrap();
    }

    #[test]
    fn unknown_id_is_an_error() {
        let mut d = doc();
        let missing = crate::document::SectionId(999);
        assert!(d.move_section_up(missing).is_err());
        assert!(d.toggle_visibility(missing).is_err());
    }

    #[test]
    fn admit_repairs_duplicate_orders() {
        let mut d = doc();
        for s in &mut d.sections {
            s.order = 3;
        }
        assert!(d.check_invariants().is_err());
        let d = d.admit().unwrap();
        assert_eq!(orders(&d), vec![0, 1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn admit_rejects_a_second_header() {
        let mut d = doc();
        let mut extra = d.header().unwrap().clone();
        extra.id = crate::document::SectionId(42);
        d.sections.push(extra);
        assert!(d.admit().is_err());

        let mut d = doc();
        d.sections.retain(|s| s.kind() != SectionKind::Header);
        assert!(d.admit().is_err());
    }
}
