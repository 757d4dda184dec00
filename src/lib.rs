//! Disjunctive top-k query evaluation over an impact-ordered inverted
//! index, with ejection-capture extensions that broaden the recall of
//! dynamic pruning beyond the usual top-k.
//!
//! The [`search`] module drives posting-list cursors with WAND or Block-Max
//! WAND. Each driver comes in four flavors: a baseline producing a single
//! safe top-k ranking, and three capture methods producing a secondary
//! ranking alongside it. Methods one and two keep the trail of documents
//! the primary heap ejects; method three is a two-stage procedure whose
//! combined rankings equal the exhaustive top-(k + k').

pub mod base;
pub mod bitset;
pub mod cursor;
pub mod cyclic;
pub mod errors;
pub mod index;
pub mod search;
pub mod topk;
