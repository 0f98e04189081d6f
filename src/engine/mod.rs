pub mod edge;
pub mod game_script;
pub mod market;
pub mod metrics;
pub mod moneyline;
pub mod price_break;
pub mod resolver;
pub mod source_stack;
pub mod spread;
pub mod status;
pub mod total;

pub use edge::{analyze_edge, evaluate_edge, EdgeAnalysis};
pub use market::{read_market, MarketRead};
