pub mod normalize;
pub mod order_line;
pub mod producer;
pub mod similarity;
pub mod tokenize;
pub mod vintage;

pub use normalize::{find_unit_quantity, normalize, search_key, strip_quantity};
pub use order_line::{OrderLine, alias_key, parse_order_line, parse_order_text};
pub use producer::{DetectedProducer, detect_producer};
pub use similarity::{MatchKind, TextMatch, name_similarity, text_similarity};
pub use tokenize::tokenize;
pub use vintage::parse_vintage;
