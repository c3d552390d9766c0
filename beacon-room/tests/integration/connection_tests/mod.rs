mod test_candidate_before_offer;
mod test_join_from_higher_remote;
