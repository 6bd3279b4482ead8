mod recency_list;

pub(crate) use recency_list::{NodeId, RecencyList};
