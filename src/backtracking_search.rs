//! This module implements solving via depth-first backtracking search over the slot/constraint
//! model, with pluggable variable-selection and value-ordering heuristics and an optional
//! one-step forward-check veto. The search is exhaustive and fully deterministic: given the same
//! grid, word list, and options, it visits the same states in the same order every time.

use smallvec::{smallvec, SmallVec};
use std::cmp::Reverse;
use std::time::{Duration, Instant};

use crate::grid_config::{puzzle_order, Choice, GridConfig, SlotId};
use crate::types::WordId;
use crate::word_list::Word;
use crate::{CHECK_INVARIANTS, LOG_SEARCH_PROCESS, MAX_GLYPH_COUNT, MAX_SLOT_COUNT};

/// How the engine picks the next unassigned slot to fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VariableSelection {
    /// Puzzle order: ascending by printed number, across before down at equal number.
    #[default]
    Static,
    /// Minimum remaining values: smallest domain first, ties kept in slot order.
    Mrv,
    /// Degree: most constraints first, ties kept in slot order.
    Deg,
    /// `Mrv`, with ties among the minimum-domain slots broken by degree.
    MrvDeg,
}

/// How the engine orders the candidate words of the selected slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValueOrder {
    /// Lexicographic ascending (the domain's own order).
    #[default]
    Static,
    /// Least constraining value: candidates leaving crossing slots the most compatible options
    /// come first; ties keep lexicographic order.
    Lcv,
}

/// Caller-facing knobs for a single solve.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchOptions {
    pub variable_selection: VariableSelection,
    pub value_order: ValueOrder,

    /// Reject a candidate if it would leave any unassigned crossing slot with zero compatible
    /// words. A one-step lookahead only: domains are never pruned, so backtracking has nothing
    /// to restore.
    pub forward_check: bool,
}

/// A struct tracking stats about the search process. Observational only; no effect on the
/// search outcome.
#[derive(Debug, Clone, Default)]
pub struct Statistics {
    /// Number of recursive calls made, counting the initial one.
    pub calls: usize,

    /// Number of trial assignments undone.
    pub backtracks: usize,

    pub total_time: Duration,
}

/// A struct representing the results of a successful solve.
#[derive(Debug)]
pub struct FillSuccess {
    pub statistics: Statistics,

    /// One choice per slot, indexed by slot id.
    pub choices: Vec<Choice>,
}

/// A completed search that proved no assignment satisfies every constraint. This is a normal
/// negative result, not an error condition.
#[derive(Debug)]
pub struct Unsatisfiable {
    pub statistics: Statistics,
}

/// Number of words, per cell of a slot, carrying each glyph in that cell across the slot's
/// domain. Backs both the forward-check veto and the LCV support sums.
type GlyphCountsByCell = Vec<SmallVec<[u32; MAX_GLYPH_COUNT]>>;

fn count_glyphs_by_cell(config: &GridConfig, slot_id: SlotId) -> GlyphCountsByCell {
    let slot = &config.slot_configs[slot_id];
    let glyph_count = config.word_list.glyphs.len();

    let mut counts: GlyphCountsByCell =
        (0..slot.length).map(|_| smallvec![0; glyph_count]).collect();

    for &word_id in &config.slot_options[slot_id] {
        let word = config.word_list.word(slot.length, word_id);
        for (cell_idx, &glyph) in word.glyphs.iter().enumerate() {
            counts[cell_idx][glyph] += 1;
        }
    }

    counts
}

/// The live state of one solve. The assignment array is the only state mutated during search;
/// everything else is read-only once built.
struct Searcher<'a> {
    config: &'a GridConfig,
    options: SearchOptions,

    /// The trial word for each slot, indexed by slot id; `None` while unassigned. Grows and
    /// shrinks by exactly one entry per recursion level.
    assignment: SmallVec<[Option<WordId>; MAX_SLOT_COUNT]>,
    assigned_count: usize,

    /// Slot ids in puzzle order, used by the `Static` selection strategy.
    static_order: Vec<SlotId>,

    /// Per-slot glyph counts over each slot's full domain.
    glyph_counts: Vec<GlyphCountsByCell>,

    statistics: Statistics,
}

impl<'a> Searcher<'a> {
    fn new(config: &'a GridConfig, options: SearchOptions) -> Searcher<'a> {
        Searcher {
            config,
            options,
            assignment: smallvec![None; config.slot_configs.len()],
            assigned_count: 0,
            static_order: puzzle_order(&config.slot_configs),
            glyph_counts: (0..config.slot_configs.len())
                .map(|slot_id| count_glyphs_by_cell(config, slot_id))
                .collect(),
            statistics: Statistics::default(),
        }
    }

    /// Choose one unassigned slot according to the configured strategy. Every tie-break is
    /// deterministic: `min_by_key` keeps the first minimum, and slots are visited in id order.
    fn select_slot(&self) -> SlotId {
        let unassigned = || {
            (0..self.config.slot_configs.len()).filter(|&slot_id| self.assignment[slot_id].is_none())
        };

        match self.options.variable_selection {
            VariableSelection::Static => self
                .static_order
                .iter()
                .copied()
                .find(|&slot_id| self.assignment[slot_id].is_none())
                .expect("select_slot called with every slot assigned"),

            VariableSelection::Mrv => unassigned()
                .min_by_key(|&slot_id| self.config.slot_options[slot_id].len())
                .expect("select_slot called with every slot assigned"),

            VariableSelection::Deg => unassigned()
                .min_by_key(|&slot_id| Reverse(self.config.adjacency[slot_id].len()))
                .expect("select_slot called with every slot assigned"),

            VariableSelection::MrvDeg => {
                let min_domain = unassigned()
                    .map(|slot_id| self.config.slot_options[slot_id].len())
                    .min()
                    .expect("select_slot called with every slot assigned");

                unassigned()
                    .filter(|&slot_id| self.config.slot_options[slot_id].len() == min_domain)
                    .min_by_key(|&slot_id| Reverse(self.config.adjacency[slot_id].len()))
                    .expect("select_slot called with every slot assigned")
            }
        }
    }

    /// Produce the slot's candidate words in trial order. For LCV, each candidate's key is the
    /// total number of words across unassigned crossing slots that stay compatible at the shared
    /// cell; the sort is stable, so equal keys keep the domain's lexicographic order.
    fn order_values(&self, slot_id: SlotId) -> Vec<WordId> {
        let mut ordered = self.config.slot_options[slot_id].clone();

        if self.options.value_order == ValueOrder::Lcv {
            let config = self.config;
            let length = config.slot_configs[slot_id].length;

            ordered.sort_by_cached_key(|&word_id| {
                let word = config.word_list.word(length, word_id);

                let supported: u64 = config.adjacency[slot_id]
                    .iter()
                    .map(|&constraint_id| {
                        let (other_slot, other_cell, own_cell) =
                            config.constraints[constraint_id].other_end(slot_id);

                        if self.assignment[other_slot].is_some() {
                            0
                        } else {
                            u64::from(
                                self.glyph_counts[other_slot][other_cell][word.glyphs[own_cell]],
                            )
                        }
                    })
                    .sum();

                Reverse(supported)
            });
        }

        ordered
    }

    /// Check the candidate against every already-assigned crossing slot: the shared cells must
    /// hold the same glyph.
    fn consistent_with_assigned(&self, slot_id: SlotId, word: &Word) -> bool {
        let config = self.config;

        config.adjacency[slot_id].iter().all(|&constraint_id| {
            let (other_slot, other_cell, own_cell) =
                config.constraints[constraint_id].other_end(slot_id);

            match self.assignment[other_slot] {
                Some(other_word_id) => {
                    let other_length = config.slot_configs[other_slot].length;
                    let other_word = config.word_list.word(other_length, other_word_id);

                    other_word.glyphs[other_cell] == word.glyphs[own_cell]
                }
                None => true,
            }
        })
    }

    /// One-step lookahead: every unassigned crossing slot must keep at least one compatible
    /// option at the shared cell.
    fn passes_forward_check(&self, slot_id: SlotId, word: &Word) -> bool {
        let config = self.config;

        config.adjacency[slot_id].iter().all(|&constraint_id| {
            let (other_slot, other_cell, own_cell) =
                config.constraints[constraint_id].other_end(slot_id);

            self.assignment[other_slot].is_some()
                || self.glyph_counts[other_slot][other_cell][word.glyphs[own_cell]] > 0
        })
    }

    /// One recursive step: select a slot, then trial its candidates in order, recursing after
    /// each accepted one and undoing the entry when the subtree fails. Returns true as soon as
    /// every slot is assigned.
    fn search(&mut self, depth: usize) -> bool {
        self.statistics.calls += 1;

        if CHECK_INVARIANTS && self.assigned_count != depth {
            panic!(
                "assignment size {} out of sync with depth {depth}",
                self.assigned_count
            );
        }

        if self.assigned_count == self.config.slot_configs.len() {
            return true;
        }

        let config = self.config;
        let slot_id = self.select_slot();
        let length = config.slot_configs[slot_id].length;

        for word_id in self.order_values(slot_id) {
            let word = config.word_list.word(length, word_id);

            if !self.consistent_with_assigned(slot_id, word) {
                continue;
            }

            if self.options.forward_check && !self.passes_forward_check(slot_id, word) {
                continue;
            }

            if LOG_SEARCH_PROCESS {
                println!(
                    "{:depth$}trying {} = {}",
                    "", config.slot_configs[slot_id].name, word.string
                );
            }

            self.assignment[slot_id] = Some(word_id);
            self.assigned_count += 1;

            if self.search(depth + 1) {
                return true;
            }

            self.assignment[slot_id] = None;
            self.assigned_count -= 1;
            self.statistics.backtracks += 1;
        }

        false
    }
}

/// Search for a complete assignment for the given grid config. Both outcomes carry the search
/// statistics; an unsatisfiable puzzle is a normal negative result reached by exhausting the
/// search space, including the case where some slot's domain is empty from the start.
pub fn find_fill(config: &GridConfig, options: SearchOptions) -> Result<FillSuccess, Unsatisfiable> {
    let start = Instant::now();

    let mut searcher = Searcher::new(config, options);
    let solved = searcher.search(0);
    searcher.statistics.total_time = start.elapsed();

    if solved {
        let choices: Vec<Choice> = searcher
            .assignment
            .iter()
            .enumerate()
            .filter_map(|(slot_id, word_id)| word_id.map(|word_id| Choice { slot_id, word_id }))
            .collect();

        Ok(FillSuccess {
            statistics: searcher.statistics,
            choices,
        })
    } else {
        Err(Unsatisfiable {
            statistics: searcher.statistics,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::backtracking_search::{
        find_fill, SearchOptions, Searcher, ValueOrder, VariableSelection,
    };
    use crate::grid::Grid;
    use crate::grid_config::{generate_grid_config, render_grid, Choice, GridConfig};
    use crate::word_list::WordList;

    fn config_from(grid_text: &str, words: &[&str]) -> GridConfig {
        let grid = Grid::parse(grid_text).expect("test grid should parse");
        let word_list = WordList::from_words(words, None, None);
        generate_grid_config(word_list, grid)
    }

    fn assigned_strings(config: &GridConfig, choices: &[Choice]) -> Vec<String> {
        choices
            .iter()
            .map(|choice| {
                let slot = &config.slot_configs[choice.slot_id];
                config.word_list.word(slot.length, choice.word_id).string.clone()
            })
            .collect()
    }

    fn assert_valid_fill(config: &GridConfig, choices: &[Choice]) {
        assert_eq!(choices.len(), config.slot_configs.len());

        for choice in choices {
            let slot = &config.slot_configs[choice.slot_id];
            let word = config.word_list.word(slot.length, choice.word_id);
            assert_eq!(word.glyphs.len(), slot.length, "{} length", slot.name);
        }

        for constraint in &config.constraints {
            let word_a = {
                let slot = &config.slot_configs[constraint.slot_a];
                config
                    .word_list
                    .word(slot.length, choices[constraint.slot_a].word_id)
            };
            let word_b = {
                let slot = &config.slot_configs[constraint.slot_b];
                config
                    .word_list
                    .word(slot.length, choices[constraint.slot_b].word_id)
            };

            assert_eq!(
                word_a.glyphs[constraint.cell_a], word_b.glyphs[constraint.cell_b],
                "constraint {} between {} and {}",
                constraint.id, constraint.slot_a, constraint.slot_b
            );
        }
    }

    fn all_option_combinations() -> Vec<SearchOptions> {
        let mut combinations = vec![];
        for variable_selection in [
            VariableSelection::Static,
            VariableSelection::Mrv,
            VariableSelection::Deg,
            VariableSelection::MrvDeg,
        ] {
            for value_order in [ValueOrder::Static, ValueOrder::Lcv] {
                for forward_check in [false, true] {
                    combinations.push(SearchOptions {
                        variable_selection,
                        value_order,
                        forward_check,
                    });
                }
            }
        }
        combinations
    }

    #[test]
    fn test_solves_crossing_pair_with_defaults() {
        let config = config_from("2 2\n1 2\n# 3", &["AT", "OK", "TO", "AN"]);

        let result = find_fill(&config, SearchOptions::default()).expect("puzzle is solvable");

        assert_valid_fill(&config, &result.choices);
        assert_eq!(assigned_strings(&config, &result.choices), vec!["AT", "TO"]);

        // 1a = AN dead-ends once (one extra call plus a backtrack), then AT succeeds.
        assert_eq!(result.statistics.calls, 4);
        assert_eq!(result.statistics.backtracks, 1);

        assert_eq!(render_grid(&config, &result.choices), "AT\n#O");
    }

    #[test]
    fn test_forward_check_vetoes_dead_candidates() {
        let config = config_from("2 2\n1 2\n# 3", &["AT", "OK", "TO", "AN"]);

        let options = SearchOptions {
            forward_check: true,
            ..SearchOptions::default()
        };
        let result = find_fill(&config, options).expect("puzzle is solvable");

        assert_eq!(assigned_strings(&config, &result.choices), vec!["AT", "TO"]);

        // 1a = AN is vetoed up front (no length-2 word starts with N), so the dead subtree is
        // never entered.
        assert_eq!(result.statistics.calls, 3);
        assert_eq!(result.statistics.backtracks, 0);
    }

    #[test]
    fn test_lcv_reorders_candidates() {
        let words = &["AT", "AN", "TO", "TA", "NO"];

        let static_config = config_from("2 2\n1 2\n# 3", words);
        let static_result =
            find_fill(&static_config, SearchOptions::default()).expect("solvable");
        assert_eq!(
            assigned_strings(&static_config, &static_result.choices),
            vec!["AN", "NO"]
        );

        // Under LCV, 1a tries AT first: its final T supports two starts (TA, TO) while AN's
        // final N supports only NO.
        let lcv_config = config_from("2 2\n1 2\n# 3", words);
        let lcv_options = SearchOptions {
            value_order: ValueOrder::Lcv,
            ..SearchOptions::default()
        };
        let lcv_result = find_fill(&lcv_config, lcv_options).expect("solvable");
        assert_eq!(
            assigned_strings(&lcv_config, &lcv_result.choices),
            vec!["AT", "TA"]
        );

        assert_valid_fill(&static_config, &static_result.choices);
        assert_valid_fill(&lcv_config, &lcv_result.choices);
    }

    #[test]
    fn test_empty_domain_is_unsatisfiable_without_panicking() {
        // No length-2 words at all, so both domains are empty.
        let config = config_from("2 2\n1 2\n# 3", &["A", "XYZ"]);

        let unsat = find_fill(&config, SearchOptions::default()).expect_err("unsolvable");

        assert_eq!(unsat.statistics.calls, 1);
        assert_eq!(unsat.statistics.backtracks, 0);
    }

    #[test]
    fn test_incompatible_crossing_is_unsatisfiable() {
        // Neither AB nor CD's final letter starts any word.
        let config = config_from("2 2\n1 2\n# 3", &["AB", "CD"]);

        let unsat = find_fill(&config, SearchOptions::default()).expect_err("unsolvable");

        assert_eq!(unsat.statistics.calls, 3);
        assert_eq!(unsat.statistics.backtracks, 2);
    }

    #[test]
    fn test_grid_without_slots_is_trivially_solved() {
        let config = config_from("1 1\n1", &["AT", "OK"]);

        let result = find_fill(&config, SearchOptions::default()).expect("trivially solvable");

        assert!(result.choices.is_empty());
        assert_eq!(result.statistics.calls, 1);
    }

    #[test]
    fn test_word_square() {
        let config = config_from("3 3\n1 2 3\n4 . .\n5 . .", &["ARE", "CAT", "TEN"]);

        let result = find_fill(&config, SearchOptions::default()).expect("solvable");

        assert_valid_fill(&config, &result.choices);
        assert_eq!(render_grid(&config, &result.choices), "CAT\nARE\nTEN");
    }

    #[test]
    fn test_every_strategy_combination_agrees_on_solvability() {
        let words = &["ARE", "CAT", "TEN", "DOG", "BEE", "COW"];

        for options in all_option_combinations() {
            let config = config_from("3 3\n1 2 3\n4 . .\n5 . .", words);
            let result = find_fill(&config, options)
                .unwrap_or_else(|_| panic!("solvable under {options:?}"));
            assert_valid_fill(&config, &result.choices);
            assert_eq!(render_grid(&config, &result.choices), "CAT\nARE\nTEN");

            let unsolvable = config_from("2 2\n1 2\n# 3", &["AB", "CD"]);
            find_fill(&unsolvable, options)
                .expect_err("unsolvable under every strategy combination");
        }
    }

    #[test]
    fn test_repeated_runs_are_deterministic() {
        let words = &["ARE", "CAT", "TEN", "DOG", "BEE", "COW"];

        for options in all_option_combinations() {
            let config = config_from("3 3\n1 2 3\n4 . .\n5 . .", words);
            let first = find_fill(&config, options).expect("solvable");
            let second = find_fill(&config, options).expect("solvable");

            assert_eq!(first.statistics.calls, second.statistics.calls);
            assert_eq!(first.statistics.backtracks, second.statistics.backtracks);
            assert_eq!(
                render_grid(&config, &first.choices),
                render_grid(&config, &second.choices)
            );
        }
    }

    // Selection-strategy fixtures below drive `select_slot` directly so each strategy's pick is
    // asserted rather than inferred from call counts.

    #[test]
    fn test_static_selection_follows_puzzle_order() {
        // Across slots 1a/3a/4a (length 2), down slots 1d/2d (length 3).
        let config = config_from(
            "3 2\n1 2\n3 .\n4 .",
            &["AT", "DO", "GO", "OX", "CAT", "DOG"],
        );

        let searcher = Searcher::new(&config, SearchOptions::default());
        assert_eq!(config.slot_configs[searcher.select_slot()].name, "1a");
    }

    #[test]
    fn test_mrv_selects_smallest_domain() {
        // The length-3 bucket (2 words) is smaller than the length-2 bucket (4 words), so MRV
        // picks the first down slot even though static order starts at 1a.
        let config = config_from(
            "3 2\n1 2\n3 .\n4 .",
            &["AT", "DO", "GO", "OX", "CAT", "DOG"],
        );

        let options = SearchOptions {
            variable_selection: VariableSelection::Mrv,
            ..SearchOptions::default()
        };
        let searcher = Searcher::new(&config, options);
        assert_eq!(config.slot_configs[searcher.select_slot()].name, "1d");
    }

    #[test]
    fn test_deg_selects_most_constrained_slot() {
        // Down slots cross three across slots each; across slots cross only two down slots.
        let config = config_from(
            "3 2\n1 2\n3 .\n4 .",
            &["AT", "DO", "GO", "OX", "CAT", "DOG"],
        );

        let options = SearchOptions {
            variable_selection: VariableSelection::Deg,
            ..SearchOptions::default()
        };
        let searcher = Searcher::new(&config, options);
        assert_eq!(config.slot_configs[searcher.select_slot()].name, "1d");
    }

    #[test]
    fn test_mrv_deg_breaks_domain_ties_by_degree() {
        // All three slots share the length-3 bucket, so MRV alone ties across all of them and
        // falls back to slot order (1a). 2d crosses both across slots while each across slot
        // crosses only 2d, so the degree tie-break picks it.
        let config = config_from("3 3\n1 2 3\n# . #\n4 . 5", &["CAB", "ABE", "BED"]);

        let mrv_options = SearchOptions {
            variable_selection: VariableSelection::Mrv,
            ..SearchOptions::default()
        };
        let searcher = Searcher::new(&config, mrv_options);
        assert_eq!(config.slot_configs[searcher.select_slot()].name, "1a");

        let mrv_deg_options = SearchOptions {
            variable_selection: VariableSelection::MrvDeg,
            ..SearchOptions::default()
        };
        let searcher = Searcher::new(&config, mrv_deg_options);
        assert_eq!(config.slot_configs[searcher.select_slot()].name, "2d");
    }
}
