//! Random question selection for both games
//!
//! Every function takes the random source explicitly so that games and
//! tests can seed it.

use itertools::Itertools;

use crate::{
    board::{Cell, CellState},
    question::Theme,
};

/// Shuffles `pool` and keeps the first `max` entries
///
/// Every call reshuffles the whole pool, so consecutive games may repeat
/// questions; a single draw never does.
pub fn draw_session<Q: Clone>(pool: &[Q], max: usize, rng: &mut fastrand::Rng) -> Vec<Q> {
    let mut shuffled = pool.to_vec();
    rng.shuffle(&mut shuffled);
    shuffled.truncate(max);
    shuffled
}

/// Picks the themes that make up the board
///
/// Themes without questions never make it onto the board. Requested ids are
/// honoured in order, skipping unknown and repeated ones. Without a usable
/// request the first `count` themes are taken.
pub fn choose_themes<'a>(themes: &'a [Theme], requested: &[String], count: usize) -> Vec<&'a Theme> {
    let playable = || themes.iter().filter(|t| !t.questions.is_empty());
    let chosen = requested
        .iter()
        .unique()
        .filter_map(|id| playable().find(|t| &t.id == id))
        .take(count)
        .collect_vec();

    if chosen.is_empty() {
        playable().take(count).collect_vec()
    } else {
        chosen
    }
}

/// Builds one row per theme with one cell per point tier
///
/// Each cell draws uniformly among the theme's questions of its tier. A
/// tier the theme has no question for is left out of the row.
pub fn build_grid(themes: &[&Theme], tiers: &[u32], rng: &mut fastrand::Rng) -> Vec<Vec<Cell>> {
    themes
        .iter()
        .map(|theme| {
            tiers
                .iter()
                .filter_map(|points| {
                    let question = rng.choice(theme.questions_worth(*points).collect_vec())?;
                    Some(Cell {
                        theme_id: theme.id.clone(),
                        question_id: question.id.clone(),
                        points: *points,
                        state: CellState::Hidden,
                        decoy: question.decoy,
                        origin_theme: question.origin_theme.clone(),
                    })
                })
                .collect_vec()
        })
        .collect_vec()
}

/// Turns some cells into decoys holding a question from another theme
///
/// Each cell that is not already a decoy becomes one with probability
/// `chance`. The origin theme is drawn uniformly among the other themes that
/// have a question of the same value, and the question uniformly among
/// those. Returns how many cells were converted.
pub fn assign_decoys(
    grid: &mut [Vec<Cell>],
    themes: &[&Theme],
    chance: f64,
    rng: &mut fastrand::Rng,
) -> usize {
    let mut converted = 0;
    for cell in grid.iter_mut().flatten() {
        if cell.decoy || rng.f64() >= chance {
            continue;
        }

        let candidates = themes
            .iter()
            .filter(|t| t.id != cell.theme_id && t.questions_worth(cell.points).next().is_some())
            .collect_vec();
        let Some(origin) = rng.choice(candidates) else {
            continue;
        };
        let Some(question) = rng.choice(origin.questions_worth(cell.points).collect_vec()) else {
            continue;
        };

        log::debug!(
            "cell {}/{} now holds {} from {}",
            cell.theme_id,
            cell.points,
            question.id,
            origin.id
        );
        cell.question_id = question.id.clone();
        cell.decoy = true;
        cell.origin_theme = Some(origin.id.clone());
        converted += 1;
    }
    converted
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::{constants::board::POINT_TIERS, question::tests::theme};

    #[test]
    fn test_draw_session_caps_and_is_unique() {
        let pool = (0..20).collect_vec();
        let mut rng = fastrand::Rng::with_seed(11);
        let drawn = draw_session(&pool, 15, &mut rng);

        assert_eq!(drawn.len(), 15);
        assert_eq!(drawn.iter().collect::<HashSet<_>>().len(), 15);
    }

    #[test]
    fn test_draw_session_small_pool() {
        let pool = vec!["a", "b", "c"];
        let mut rng = fastrand::Rng::with_seed(2);
        let drawn = draw_session(&pool, 15, &mut rng);

        assert_eq!(drawn.len(), 3);
        assert!(draw_session::<u8>(&[], 15, &mut rng).is_empty());
    }

    #[test]
    fn test_choose_themes() {
        let themes = (0..8).map(|i| theme(&format!("t{i}"), 1)).collect_vec();

        let first = choose_themes(&themes, &[], 6);
        assert_eq!(
            first.iter().map(|t| t.id.as_str()).collect_vec(),
            vec!["t0", "t1", "t2", "t3", "t4", "t5"]
        );

        let requested = ["t7", "missing", "t2", "t7"].map(String::from);
        let picked = choose_themes(&themes, &requested, 6);
        assert_eq!(
            picked.iter().map(|t| t.id.as_str()).collect_vec(),
            vec!["t7", "t2"]
        );

        let unusable = ["nope".to_owned()];
        assert_eq!(choose_themes(&themes, &unusable, 6).len(), 6);
    }

    #[test]
    fn test_choose_themes_skips_empty_themes() {
        let mut themes = (0..8).map(|i| theme(&format!("t{i}"), 1)).collect_vec();
        themes[1].questions.clear();
        themes[4].questions.clear();

        let first = choose_themes(&themes, &[], 6);
        assert_eq!(
            first.iter().map(|t| t.id.as_str()).collect_vec(),
            vec!["t0", "t2", "t3", "t5", "t6", "t7"]
        );

        let requested = ["t1", "t3"].map(String::from);
        let picked = choose_themes(&themes, &requested, 6);
        assert_eq!(picked.iter().map(|t| t.id.as_str()).collect_vec(), vec!["t3"]);
    }

    #[test]
    fn test_build_grid_one_cell_per_tier() {
        let themes = (0..6).map(|i| theme(&format!("t{i}"), 4)).collect_vec();
        let refs = themes.iter().collect_vec();
        let mut rng = fastrand::Rng::with_seed(5);
        let grid = build_grid(&refs, &POINT_TIERS, &mut rng);

        assert_eq!(grid.len(), 6);
        for (row, theme) in grid.iter().zip(&themes) {
            assert_eq!(row.iter().map(|c| c.points).collect_vec(), POINT_TIERS.to_vec());
            for cell in row {
                let question = theme.question(&cell.question_id).unwrap();
                assert_eq!(question.points, cell.points);
                assert_eq!(cell.state, CellState::Hidden);
                assert!(!cell.decoy);
            }
        }
    }

    #[test]
    fn test_build_grid_skips_missing_tier() {
        let mut sparse = theme("sparse", 1);
        sparse.questions.retain(|q| q.points != 300);
        let mut rng = fastrand::Rng::with_seed(5);
        let grid = build_grid(&[&sparse], &POINT_TIERS, &mut rng);

        assert_eq!(
            grid[0].iter().map(|c| c.points).collect_vec(),
            vec![100, 200, 400, 500]
        );
    }

    #[test]
    fn test_decoys_come_from_other_themes_with_same_value() {
        let themes = (0..6).map(|i| theme(&format!("t{i}"), 3)).collect_vec();
        let refs = themes.iter().collect_vec();

        for seed in 0..20 {
            let mut rng = fastrand::Rng::with_seed(seed);
            let mut grid = build_grid(&refs, &POINT_TIERS, &mut rng);
            let converted = assign_decoys(&mut grid, &refs, 0.5, &mut rng);

            let decoys = grid.iter().flatten().filter(|c| c.decoy).collect_vec();
            assert_eq!(decoys.len(), converted);
            for cell in decoys {
                let origin_id = cell.origin_theme.as_deref().unwrap();
                assert_ne!(origin_id, cell.theme_id);
                let origin = themes.iter().find(|t| t.id == origin_id).unwrap();
                assert_eq!(origin.question(&cell.question_id).unwrap().points, cell.points);
            }
        }
    }

    #[test]
    fn test_decoy_chance_bounds() {
        let themes = (0..3).map(|i| theme(&format!("t{i}"), 1)).collect_vec();
        let refs = themes.iter().collect_vec();
        let mut rng = fastrand::Rng::with_seed(9);

        let mut grid = build_grid(&refs, &POINT_TIERS, &mut rng);
        assert_eq!(assign_decoys(&mut grid, &refs, 0.0, &mut rng), 0);

        let mut grid = build_grid(&refs, &POINT_TIERS, &mut rng);
        assert_eq!(assign_decoys(&mut grid, &refs, 1.0, &mut rng), 15);
    }

    #[test]
    fn test_single_theme_gets_no_decoys() {
        let only = theme("only", 2);
        let mut rng = fastrand::Rng::with_seed(4);
        let mut grid = build_grid(&[&only], &POINT_TIERS, &mut rng);

        assert_eq!(assign_decoys(&mut grid, &[&only], 1.0, &mut rng), 0);
    }

    #[test]
    fn test_source_decoys_are_not_rerolled() {
        let mut marked = theme("marked", 1);
        for question in &mut marked.questions {
            question.decoy = true;
            question.origin_theme = Some("elsewhere".to_owned());
        }
        let other = theme("other", 1);
        let refs = [&marked, &other];
        let mut rng = fastrand::Rng::with_seed(8);
        let mut grid = build_grid(&refs, &POINT_TIERS, &mut rng);
        let before = grid[0].clone();

        assign_decoys(&mut grid, &refs, 1.0, &mut rng);
        assert_eq!(grid[0], before);
        assert!(grid[1].iter().all(|c| c.origin_theme.as_deref() == Some("marked")));
    }
}
