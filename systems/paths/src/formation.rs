//! Per-member formation offsets.

use std::f32::consts::TAU;

use skyraid_core::{FormationDefinition, FormationLayout, Vec2};

/// Offset of member `index` within `formation`.
///
/// Pure and deterministic. Out-of-range custom offsets and single-member
/// circles yield a zero offset.
#[must_use]
pub fn offset(formation: &FormationDefinition, index: usize) -> Vec2 {
    layout_offset(&formation.layout, formation.members as usize, index)
}

/// Offset of member `index` for a layout holding `count` members.
#[must_use]
pub fn layout_offset(layout: &FormationLayout, count: usize, index: usize) -> Vec2 {
    match layout {
        FormationLayout::CustomOffsets { offsets } => {
            offsets.get(index).copied().unwrap_or(Vec2::ZERO)
        }
        FormationLayout::Line { spacing } => {
            let centre = count.saturating_sub(1) as f32 / 2.0;
            Vec2::new((index as f32 - centre) * spacing, 0.0)
        }
        FormationLayout::Grid {
            columns,
            column_spacing,
            row_spacing,
        } => {
            let columns = (*columns).max(1) as usize;
            let column = index % columns;
            let row = index / columns;
            Vec2::new(column as f32 * column_spacing, -(row as f32) * row_spacing)
        }
        FormationLayout::Circle { radius } => {
            if count <= 1 {
                return Vec2::ZERO;
            }
            let angle = TAU * index as f32 / count as f32;
            Vec2::new(angle.cos(), angle.sin()) * *radius
        }
    }
}
