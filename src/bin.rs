use clap::{Parser, ValueEnum};
use crossfill_core::backtracking_search::{
    find_fill, SearchOptions, Statistics, ValueOrder, VariableSelection,
};
use crossfill_core::grid::Grid;
use crossfill_core::grid_config::{generate_grid_config, puzzle_order, render_grid};
use crossfill_core::word_list::WordList;
use fancy_regex::Regex;
use std::fmt::{Debug, Formatter};
use std::fs;

/// crossfill: Command-line crossword solving tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the grid file: a "rows cols" header line followed by one line per row of cell
    /// tokens, with # for blocks, . for open cells, and integers for numbered cells
    grid_path: String,

    /// Path to the word list file, one word per line
    wordlist_path: String,

    /// Strategy for choosing which slot to fill next
    #[arg(long, value_enum, default_value = "static")]
    variable_selection: VariableSelectionArg,

    /// Strategy for ordering a slot's candidate words
    #[arg(long, value_enum, default_value = "static")]
    value_order: ValueOrderArg,

    /// Reject candidates that would leave a crossing slot with no viable words
    #[arg(long)]
    forward_check: bool,

    /// Keep only word list entries matching this regular expression
    #[arg(long)]
    filter: Option<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum VariableSelectionArg {
    Static,
    Mrv,
    Deg,
    #[value(alias = "mrv+deg")]
    MrvDeg,
}

impl From<VariableSelectionArg> for VariableSelection {
    fn from(arg: VariableSelectionArg) -> VariableSelection {
        match arg {
            VariableSelectionArg::Static => VariableSelection::Static,
            VariableSelectionArg::Mrv => VariableSelection::Mrv,
            VariableSelectionArg::Deg => VariableSelection::Deg,
            VariableSelectionArg::MrvDeg => VariableSelection::MrvDeg,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum ValueOrderArg {
    Static,
    Lcv,
}

impl From<ValueOrderArg> for ValueOrder {
    fn from(arg: ValueOrderArg) -> ValueOrder {
        match arg {
            ValueOrderArg::Static => ValueOrder::Static,
            ValueOrderArg::Lcv => ValueOrder::Lcv,
        }
    }
}

struct Error(String);

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0) // Print error unquoted
    }
}

fn print_statistics(statistics: &Statistics) {
    println!(
        "{} calls, {} backtracks, {:?}",
        statistics.calls, statistics.backtracks, statistics.total_time
    );
}

fn main() -> Result<(), Error> {
    let args = Args::parse();

    let grid_content = fs::read_to_string(&args.grid_path)
        .map_err(|_| Error(format!("Couldn't read file '{}'", args.grid_path)))?;

    let grid = Grid::parse(&grid_content).map_err(|err| Error(format!("{err}")))?;

    let filter = args
        .filter
        .as_deref()
        .map(Regex::new)
        .transpose()
        .map_err(|err| Error(format!("Invalid filter pattern: {err}")))?;

    let max_side = grid.height().max(grid.width());
    let word_list = WordList::from_dict_file(&args.wordlist_path, Some(max_side), filter.as_ref())
        .map_err(|err| Error(format!("{err}")))?;

    if word_list.is_empty() {
        return Err(Error("Word list is empty".into()));
    }

    let config = generate_grid_config(word_list, grid);

    let options = SearchOptions {
        variable_selection: args.variable_selection.into(),
        value_order: args.value_order.into(),
        forward_check: args.forward_check,
    };

    match find_fill(&config, options) {
        Ok(result) => {
            println!("{}", render_grid(&config, &result.choices));
            println!();

            for &slot_id in &puzzle_order(&config.slot_configs) {
                let slot = &config.slot_configs[slot_id];
                let word = config
                    .word_list
                    .word(slot.length, result.choices[slot_id].word_id);
                println!("{} = {}", slot.name, word.string);
            }

            println!();
            print_statistics(&result.statistics);
            Ok(())
        }
        Err(unsat) => {
            print_statistics(&unsat.statistics);
            Err(Error(
                "No assignment of words satisfies every crossing".into(),
            ))
        }
    }
}
