//! Search Module Tests
//!
//! Validates query parsing, the node state machine, result combination,
//! progress reporting and live-search deduplication.
//!
//! ## Test Scopes
//! - **Lexer / Parser**: Token streams, tree shapes and rejected queries.
//! - **Combiner**: Set algebra and phrase adjacency.
//! - **Node**: Status transitions, single combination, abort propagation.
//! - **Progress**: Aggregation and sub-progress flattening.
//! - **Registry**: Dedup, eviction after the result is taken.
//! - **HTTP**: The public search API end to end over a memory index.
//!
//! Most tests run against `ManualIndex`, whose lookups stay pending until the
//! test completes or aborts them.

#[cfg(test)]
mod tests {
    use crate::error::SearchError;
    use crate::index::IndexBackend;
    use crate::index::catalog::IndexCatalog;
    use crate::index::request::{Request, Responder};
    use crate::index::types::{TermEntry, UriEntry};
    use crate::search::combiner::{ResultSet, combine};
    use crate::search::lexer::{Token, render, tokenize};
    use crate::search::node::SearchNode;
    use crate::search::progress::{Progress, aggregate};
    use crate::search::registry::{SearchRegistry, search_hash};
    use crate::search::types::{Operation, ProgressParts, SearchStatus};
    use crate::server::build_router;

    use axum::body::Body;
    use axum::http::{Request as HttpRequest, StatusCode};
    use http_body_util::BodyExt;
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::collections::BTreeSet;
    use std::sync::{Arc, Weak};
    use tower::ServiceExt;

    // ============================================================
    // TEST BACKEND
    // ============================================================

    /// Backend whose term lookups are resolved by the test itself.
    struct ManualIndex {
        locator: String,
        pending: Mutex<Vec<Responder<Vec<TermEntry>>>>,
        dispatched: Mutex<Vec<String>>,
    }

    impl ManualIndex {
        fn new(locator: &str) -> Arc<Self> {
            Arc::new(Self {
                locator: locator.to_string(),
                pending: Mutex::new(Vec::new()),
                dispatched: Mutex::new(Vec::new()),
            })
        }

        fn dispatched(&self) -> Vec<String> {
            self.dispatched.lock().clone()
        }

        fn take(&self, term: &str) -> Vec<Responder<Vec<TermEntry>>> {
            let mut pending = self.pending.lock();
            let (matched, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut *pending)
                .into_iter()
                .partition(|responder| responder.subject() == term);
            *pending = rest;
            assert!(!matched.is_empty(), "no pending lookup for '{}'", term);
            matched
        }

        fn complete(&self, term: &str, entries: &[TermEntry]) {
            for responder in self.take(term) {
                responder.complete(entries.to_vec());
            }
        }

        fn abort(&self, term: &str, reason: &str) {
            for responder in self.take(term) {
                responder.abort(reason);
            }
        }
    }

    impl IndexBackend for ManualIndex {
        fn locator(&self) -> &str {
            &self.locator
        }

        fn term_entries(&self, term: &str) -> Request<Vec<TermEntry>> {
            let (request, responder) = Request::pending(term);
            self.pending.lock().push(responder);
            self.dispatched.lock().push(term.to_string());
            request
        }

        fn uri_entry(&self, uri: &str) -> Request<Option<UriEntry>> {
            Request::ready(uri, None)
        }
    }

    fn setup() -> (Arc<SearchRegistry>, Arc<ManualIndex>, Arc<ManualIndex>) {
        let catalog = Arc::new(IndexCatalog::new());
        let idx_a = ManualIndex::new("idxA");
        let idx_b = ManualIndex::new("idxB");
        catalog.register("idxA", idx_a.clone());
        catalog.register("idxB", idx_b.clone());
        (SearchRegistry::new(catalog), idx_a, idx_b)
    }

    fn entry(term: &str, uri: &str, positions: &[u32]) -> TermEntry {
        TermEntry::new(term, uri, positions.iter().copied())
    }

    fn child_subjects(node: &SearchNode) -> Vec<String> {
        node.children()
            .iter()
            .map(|child| child.subject().to_string())
            .collect()
    }

    fn uris(set: &ResultSet) -> Vec<String> {
        set.uris().map(str::to_string).collect()
    }

    fn leaf(word: &str) -> Arc<SearchNode> {
        SearchNode::leaf(word, "idxA", Request::ready(word, Vec::new()), Weak::new())
    }

    // ============================================================
    // LEXER TESTS
    // ============================================================

    fn term(word: &str) -> Token {
        Token::Term(word.to_string())
    }

    #[rstest]
    #[case("cat", vec![term("cat")])]
    #[case("cat dog", vec![term("cat"), Token::And, term("dog")])]
    #[case("cat or dog", vec![term("cat"), Token::Or, term("dog")])]
    #[case("cat not dog", vec![term("cat"), Token::Not, term("dog")])]
    #[case("cat -dog", vec![term("cat"), Token::Not, term("dog")])]
    #[case("or cat", vec![term("or"), Token::And, term("cat")])]
    #[case("cat or", vec![term("cat"), Token::And, term("or")])]
    #[case(
        "\"big cat\" dog",
        vec![Token::Phrase(vec!["big".to_string(), "cat".to_string()]), Token::And, term("dog")]
    )]
    fn test_tokenize(#[case] query: &str, #[case] expected: Vec<Token>) {
        assert_eq!(tokenize(query).unwrap(), expected);
    }

    #[rstest]
    #[case("-cat")]
    #[case("cat -")]
    #[case("cat - dog")]
    #[case("\"big cat")]
    #[case("big\"cat\"")]
    #[case("\"big cat\"dog")]
    #[case("c@t")]
    #[case("cat not -dog")]
    fn test_tokenize_rejects(#[case] query: &str) {
        let err = tokenize(query).unwrap_err();
        assert!(err.is_parse_error(), "{}: {}", query, err);
    }

    #[test]
    fn test_render_spells_connectives_out() {
        let tokens = tokenize("\"big cat\" -dog or bird").unwrap();

        assert_eq!(render(&tokens), "\"big cat\" not dog or bird");
        assert_eq!(tokenize(&render(&tokens)).unwrap(), tokens);
    }

    // ============================================================
    // PARSER TESTS
    // ============================================================

    #[test]
    fn test_parse_single_term() {
        let (registry, idx_a, _) = setup();

        let node = registry.start_search("cat", "idxA").unwrap();

        assert_eq!(node.operation(), Operation::Term);
        assert!(node.is_leaf());
        assert_eq!(node.subject(), "cat@idxA");
        let progress = node.sub_progress();
        assert_eq!(progress.len(), 1);
        assert!(Arc::ptr_eq(&progress[0], &node));
        assert_eq!(idx_a.dispatched(), vec!["cat".to_string()]);
    }

    #[rstest]
    #[case("\"big cat\"", Operation::Phrase, &["big@idxA", "cat@idxA"])]
    #[case("cat not dog", Operation::Difference, &["cat@idxA", "dog@idxA"])]
    #[case("cat -dog", Operation::Difference, &["cat@idxA", "dog@idxA"])]
    #[case("cat dog", Operation::Intersection, &["cat@idxA", "dog@idxA"])]
    #[case("cat or dog", Operation::Union, &["cat@idxA", "dog@idxA"])]
    #[case("cat dog bird", Operation::Intersection, &["cat@idxA", "dog@idxA", "bird@idxA"])]
    fn test_parse_shapes(
        #[case] query: &str,
        #[case] operation: Operation,
        #[case] children: &[&str],
    ) {
        let (registry, _, _) = setup();

        let node = registry.start_search(query, "idxA").unwrap();

        assert_eq!(node.operation(), operation);
        assert_eq!(node.subject(), format!("{}@idxA", query));
        assert_eq!(child_subjects(&node), children);
        assert!(node.children().iter().all(|child| child.is_leaf()));
    }

    #[test]
    fn test_parse_precedence() {
        let (registry, _, _) = setup();

        // negation splits first, then AND, then OR
        let node = registry.start_search("cat dog or bird -fish", "idxA").unwrap();

        assert_eq!(node.operation(), Operation::Difference);
        assert_eq!(
            child_subjects(&node),
            vec!["cat dog or bird@idxA", "fish@idxA"]
        );
        let remainder = &node.children()[0];
        assert_eq!(remainder.operation(), Operation::Intersection);
        assert_eq!(child_subjects(remainder), vec!["cat@idxA", "dog or bird@idxA"]);
        assert_eq!(remainder.children()[1].operation(), Operation::Union);
    }

    #[test]
    fn test_parse_multi_index() {
        let (registry, idx_a, idx_b) = setup();

        let node = registry.start_search("cat", "idxA idxB").unwrap();

        assert_eq!(node.operation(), Operation::MultiIndexMerge);
        assert_eq!(node.subject(), "cat@idxA idxB");
        assert_eq!(child_subjects(&node), vec!["cat@idxA", "cat@idxB"]);
        assert_eq!(idx_a.dispatched(), vec!["cat".to_string()]);
        assert_eq!(idx_b.dispatched(), vec!["cat".to_string()]);

        let same = registry.start_search("cat", "idxA;idxB").unwrap();
        assert!(Arc::ptr_eq(&node, &same));
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("-cat")]
    #[case("\"cat\"")]
    #[case("\"\"")]
    #[case("cat & dog")]
    fn test_parse_rejects_query(#[case] query: &str) {
        let (registry, _, _) = setup();

        let err = registry.start_search(query, "idxA").unwrap_err();

        assert!(err.is_parse_error(), "{}: {}", query, err);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_parse_rejects_locators() {
        let (registry, idx_a, _) = setup();

        let none = registry.start_search("cat", " ; ").unwrap_err();
        let unknown = registry.start_search("cat", "idxA nowhere").unwrap_err();

        assert!(matches!(none, SearchError::Parse(_)));
        assert_eq!(unknown, SearchError::UnknownIndex("nowhere".to_string()));
        assert!(registry.is_empty());
        assert!(idx_a.dispatched().is_empty());
    }

    #[rstest]
    #[case("cat dog bird \"x\"")]
    #[case("cat or \"\"")]
    #[case("cat dog -")]
    #[case("cat \"big cat\" c@t")]
    fn test_rejected_query_dispatches_nothing(#[case] query: &str) {
        let (registry, idx_a, idx_b) = setup();

        let err = registry.start_search(query, "idxA idxB").unwrap_err();

        assert!(err.is_parse_error(), "{}: {}", query, err);
        assert!(idx_a.dispatched().is_empty());
        assert!(idx_b.dispatched().is_empty());
        assert!(registry.is_empty());
    }

    // ============================================================
    // ARITY TESTS
    // ============================================================

    #[rstest]
    #[case(Operation::Term, 0, true)]
    #[case(Operation::Term, 1, false)]
    #[case(Operation::Difference, 1, false)]
    #[case(Operation::Difference, 2, true)]
    #[case(Operation::Difference, 3, false)]
    #[case(Operation::Phrase, 1, false)]
    #[case(Operation::Union, 5, true)]
    #[case(Operation::MultiIndexMerge, 2, true)]
    fn test_check_arity(#[case] operation: Operation, #[case] children: usize, #[case] ok: bool) {
        assert_eq!(operation.check_arity(children).is_ok(), ok);
    }

    #[rstest]
    #[case(Operation::Difference, 1)]
    #[case(Operation::Difference, 3)]
    #[case(Operation::Intersection, 1)]
    #[case(Operation::Union, 1)]
    #[case(Operation::Phrase, 1)]
    #[case(Operation::Term, 2)]
    fn test_composite_rejects_wrong_arity(#[case] operation: Operation, #[case] count: usize) {
        let children = (0..count).map(|i| leaf(&format!("w{}", i))).collect();

        let err = SearchNode::composite("q", "idxA", operation, children, Weak::new()).unwrap_err();

        assert!(matches!(err, SearchError::Parse(_)));
    }

    // ============================================================
    // COMBINER TESTS
    // ============================================================

    fn set(subject: &str, docs: Vec<(&str, Vec<u32>)>) -> Arc<ResultSet> {
        Arc::new(ResultSet::from_entries(
            subject,
            docs.iter().map(|(uri, positions)| entry(subject, uri, positions)),
        ))
    }

    fn positions(values: &[u32]) -> BTreeSet<u32> {
        values.iter().copied().collect()
    }

    #[test]
    fn test_combine_union_merges_positions() {
        let a = set("a", vec![("d1", vec![1])]);
        let b = set("b", vec![("d1", vec![5]), ("d2", vec![2])]);

        let result = combine(Operation::Union, "a or b", [Ok(a), Ok(b)]).unwrap();

        assert_eq!(uris(&result), vec!["d1", "d2"]);
        assert_eq!(result.get("d1").unwrap().positions, positions(&[1, 5]));
        assert_eq!(result.get("d1").unwrap().subject, "a or b");
    }

    #[test]
    fn test_combine_intersection_and_difference() {
        let a = set("a", vec![("d1", vec![0]), ("d2", vec![0])]);
        let b = set("b", vec![("d2", vec![3]), ("d3", vec![1])]);

        let both = combine(Operation::Intersection, "a b", [Ok(a.clone()), Ok(b.clone())]).unwrap();
        let only_a = combine(Operation::Difference, "a not b", [Ok(a), Ok(b)]).unwrap();

        assert_eq!(uris(&both), vec!["d2"]);
        assert_eq!(both.get("d2").unwrap().positions, positions(&[0, 3]));
        assert_eq!(uris(&only_a), vec!["d1"]);
    }

    #[test]
    fn test_combine_phrase_requires_adjacency_in_order() {
        let new = set("new", vec![("d1", vec![0, 10]), ("d2", vec![4])]);
        let york = set("york", vec![("d1", vec![1, 11]), ("d2", vec![3])]);
        let city = set("city", vec![("d1", vec![12]), ("d2", vec![5])]);

        let result = combine(Operation::Phrase, "\"new york city\"", [Ok(new), Ok(york), Ok(city)]).unwrap();

        assert_eq!(uris(&result), vec!["d1"]);
        assert_eq!(result.get("d1").unwrap().positions, positions(&[10]));
    }

    #[test]
    fn test_combine_abort_short_circuits() {
        let a = set("a", vec![("d1", vec![0])]);
        let abort = SearchError::abort("b", "index offline");

        let result = combine(Operation::Union, "a or b", [Ok(a), Err(abort.clone())]);

        assert_eq!(result, Err(abort));
    }

    #[test]
    fn test_result_set_merges_duplicate_uris() {
        let set = ResultSet::from_entries(
            "cat",
            [entry("cat", "d1", &[1]), entry("cat", "d1", &[7])],
        );

        assert_eq!(set.len(), 1);
        assert_eq!(set.get("d1").unwrap().positions, positions(&[1, 7]));
    }

    // ============================================================
    // NODE STATE TESTS
    // ============================================================

    #[test]
    fn test_status_transitions() {
        let (registry, idx_a, _) = setup();
        let node = registry.start_search("cat dog", "idxA").unwrap();

        assert_eq!(node.status(), SearchStatus::Busy);
        assert_eq!(node.result(), Ok(None));

        idx_a.complete("cat", &[entry("cat", "d1", &[0]), entry("cat", "d2", &[0])]);
        assert_eq!(node.status(), SearchStatus::Busy);
        assert_eq!(node.is_done(), Ok(false));

        idx_a.complete("dog", &[entry("dog", "d2", &[1])]);
        assert_eq!(node.is_done(), Ok(true));
        assert_eq!(node.status(), SearchStatus::Ready);

        let result = node.result().unwrap().unwrap();
        assert_eq!(uris(&result), vec!["d2"]);
        assert_eq!(node.status(), SearchStatus::Done);

        let again = node.result().unwrap().unwrap();
        assert!(Arc::ptr_eq(&result, &again));
    }

    #[test]
    fn test_phrase_search_end_to_end() {
        let (registry, idx_a, _) = setup();
        let node = registry.start_search("\"big cat\"", "idxA").unwrap();

        idx_a.complete("big", &[entry("big", "d1", &[3]), entry("big", "d2", &[3])]);
        idx_a.complete("cat", &[entry("cat", "d1", &[4, 9]), entry("cat", "d2", &[9])]);

        let result = node.result().unwrap().unwrap();
        assert_eq!(uris(&result), vec!["d1"]);
        assert_eq!(result.subject, "\"big cat\"@idxA");
    }

    #[test]
    fn test_multi_index_merge_result() {
        let (registry, idx_a, idx_b) = setup();
        let node = registry.start_search("cat -dog", "idxA idxB").unwrap();

        idx_a.complete("cat", &[entry("cat", "a1", &[0]), entry("cat", "a2", &[0])]);
        idx_a.complete("dog", &[entry("dog", "a2", &[1])]);
        idx_b.complete("cat", &[entry("cat", "b1", &[0])]);
        idx_b.complete("dog", &[]);

        let result = node.result().unwrap().unwrap();
        assert_eq!(uris(&result), vec!["a1", "b1"]);
    }

    #[test]
    fn test_abort_propagates_to_root() {
        // ARRANGE
        let (registry, idx_a, _) = setup();
        let node = registry.start_search("cat dog or bird", "idxA").unwrap();
        idx_a.complete("cat", &[entry("cat", "d1", &[0])]);
        idx_a.complete("dog", &[]);

        // ACT
        idx_a.abort("bird", "index offline");

        // ASSERT
        let expected = SearchError::abort("bird", "index offline");
        assert_eq!(node.is_done(), Err(expected.clone()));
        assert_eq!(node.status(), SearchStatus::Busy);
        assert_eq!(node.parts(), Err(expected.clone()));

        assert_eq!(node.result(), Err(expected.clone()));
        assert_eq!(node.status(), SearchStatus::Combining);
        assert_eq!(node.result(), Err(expected));
        assert_ne!(node.status(), SearchStatus::Done);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_concurrent_results_share_one_combination() {
        let (registry, idx_a, _) = setup();
        let node = registry.start_search("cat or dog", "idxA").unwrap();
        idx_a.complete("cat", &[entry("cat", "d1", &[0])]);
        idx_a.complete("dog", &[entry("dog", "d2", &[0])]);

        let results: Vec<Arc<ResultSet>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| node.result().unwrap().unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert!(results.iter().all(|r| Arc::ptr_eq(r, &results[0])));
        assert_eq!(uris(&results[0]), vec!["d1", "d2"]);
        assert_eq!(node.status(), SearchStatus::Done);
    }

    #[test]
    fn test_node_display() {
        let (registry, _, _) = setup();

        let node = registry.start_search("cat dog", "idxA").unwrap();

        assert_eq!(
            node.to_string(),
            "Search: Intersection : cat dog@idxA : [\"cat@idxA\", \"dog@idxA\"]"
        );
    }

    #[tokio::test]
    async fn test_wait_resolves_with_tree() {
        let (registry, idx_a, _) = setup();
        let node = registry.start_search("cat or dog", "idxA").unwrap();

        let completer = idx_a.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            completer.complete("dog", &[entry("dog", "d2", &[0])]);
            completer.complete("cat", &[]);
        });

        node.wait().await.unwrap();
        assert_eq!(uris(&node.result().unwrap().unwrap()), vec!["d2"]);
    }

    // ============================================================
    // PROGRESS TESTS
    // ============================================================

    #[test]
    fn test_aggregate_empty() {
        let providers: Vec<&SearchNode> = Vec::new();

        assert_eq!(aggregate(providers), Ok(ProgressParts::new(0, 0, true)));
    }

    #[test]
    fn test_aggregate_mixed_providers() {
        let (request, responder) = Request::<u32>::pending("estimate");
        responder.report(ProgressParts::new(2, 5, false));
        let node = leaf("cat");

        let providers: Vec<&dyn Progress> = vec![&request, &*node];

        assert_eq!(aggregate(providers), Ok(ProgressParts::new(3, 6, false)));
    }

    #[test]
    fn test_sub_progress_flattens_boolean_structure() {
        let (registry, idx_a, _) = setup();
        let node = registry.start_search("cat dog or bird", "idxA").unwrap();

        let subjects: Vec<String> = node
            .sub_progress()
            .iter()
            .map(|p| p.subject().to_string())
            .collect();

        assert_eq!(subjects, vec!["cat@idxA", "dog@idxA", "bird@idxA"]);
        assert_eq!(node.parts(), Ok(ProgressParts::new(0, 3, true)));

        idx_a.complete("cat", &[]);
        assert_eq!(node.parts(), Ok(ProgressParts::new(1, 3, true)));
    }

    #[test]
    fn test_sub_progress_keeps_index_structure() {
        let (registry, idx_a, _) = setup();
        let node = registry.start_search("cat dog", "idxA idxB").unwrap();

        let progress = node.sub_progress();

        assert_eq!(progress.len(), 2);
        assert_eq!(progress[0].subject(), "cat dog@idxA");
        assert_eq!(progress[1].subject(), "cat dog@idxB");
        assert_eq!(node.parts(), Ok(ProgressParts::new(0, 4, true)));

        idx_a.complete("dog", &[]);
        assert_eq!(node.parts(), Ok(ProgressParts::new(1, 4, true)));
    }

    // ============================================================
    // REGISTRY TESTS
    // ============================================================

    #[test]
    fn test_start_search_deduplicates_concurrent_calls() {
        let (registry, idx_a, _) = setup();

        let (first, second) = std::thread::scope(|scope| {
            let a = scope.spawn(|| registry.start_search("Cat ", " idxA ").unwrap());
            let b = scope.spawn(|| registry.start_search("cat", "idxA").unwrap());
            (a.join().unwrap(), b.join().unwrap())
        });

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
        assert_eq!(idx_a.dispatched(), vec!["cat".to_string()]);
        assert!(registry.contains("CAT", "idxA"));
    }

    #[test]
    fn test_result_evicts_search() {
        // ARRANGE
        let (registry, idx_a, _) = setup();
        let node = registry.start_search("cat", "idxA").unwrap();
        let hash = node.hash_code();
        assert_eq!(hash, search_hash("cat", "idxA"));
        assert!(registry.lookup_by_hash(hash).is_some());

        // ACT
        assert_eq!(node.result(), Ok(None));
        assert!(registry.lookup("cat", "idxA").is_some());
        idx_a.complete("cat", &[entry("cat", "d1", &[0])]);
        let result = node.result().unwrap();

        // ASSERT
        assert!(result.is_some());
        assert!(registry.lookup("cat", "idxA").is_none());
        assert!(registry.lookup_by_key("cat@idxA").is_none());
        assert!(registry.lookup_by_hash(hash).is_none());

        let fresh = registry.start_search("cat", "idxA").unwrap();
        assert!(!Arc::ptr_eq(&node, &fresh));
        assert_eq!(idx_a.dispatched().len(), 2);
    }

    #[test]
    fn test_stale_node_does_not_evict_fresh_one() {
        let (registry, idx_a, _) = setup();
        let stale = registry.start_search("cat", "idxA").unwrap();
        idx_a.complete("cat", &[]);
        stale.result().unwrap();
        let fresh = registry.start_search("cat", "idxA").unwrap();

        registry.remove(&stale);

        let live = registry.lookup("cat", "idxA").unwrap();
        assert!(Arc::ptr_eq(&live, &fresh));
    }

    #[test]
    fn test_hash_collision_keeps_first_search() {
        let (registry, _, _) = setup();
        let cat = registry.start_search("cat", "idxA").unwrap();
        let dog = registry.start_search("dog", "idxA").unwrap();

        let filed = registry.index_hash(cat.hash_code(), &dog);

        assert!(!filed);
        let held = registry.lookup_by_hash(cat.hash_code()).unwrap();
        assert!(Arc::ptr_eq(&held, &cat));
        assert!(registry.index_hash(cat.hash_code(), &cat));

        registry.remove(&dog);
        assert!(registry.lookup_by_hash(cat.hash_code()).is_some());
    }

    #[test]
    fn test_list_all_and_clear() {
        let (registry, _, _) = setup();
        registry.start_search("dog", "idxA").unwrap();
        registry.start_search("cat", "idxA idxB").unwrap();

        let subjects: Vec<String> = registry
            .list_all()
            .iter()
            .map(|node| node.subject().to_string())
            .collect();
        assert_eq!(subjects, vec!["cat@idxA idxB", "dog@idxA"]);

        registry.clear();
        assert!(registry.is_empty());
        assert!(registry.lookup_by_hash(search_hash("dog", "idxA")).is_none());
    }

    // ============================================================
    // HTTP TESTS
    // ============================================================

    async fn send(app: &axum::Router, request: HttpRequest<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    fn get(uri: &str) -> HttpRequest<Body> {
        HttpRequest::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_search(query: &str, indexes: &str) -> HttpRequest<Body> {
        let body = serde_json::json!({ "query": query, "indexes": indexes });
        HttpRequest::builder()
            .method("POST")
            .uri("/search")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn books() -> Arc<IndexCatalog> {
        let catalog = Arc::new(IndexCatalog::new());
        let books = catalog.local_or_create("books");
        books.add_document("a.txt", Some("Alpha"), "the quick brown fox jumps over the lazy dog");
        books.add_document("b.txt", Some("Beta"), "a quick fox and a lazy cat");
        books.add_document("c.txt", None, "lazy afternoons");
        catalog
    }

    #[tokio::test]
    async fn test_memory_index_search() {
        let registry = SearchRegistry::new(books());

        let node = registry.start_search("\"quick brown\" or lazy -dog", "books").unwrap();
        node.wait().await.unwrap();

        let result = node.result().unwrap().unwrap();
        assert_eq!(uris(&result), vec!["b.txt", "c.txt"]);
    }

    #[test]
    fn test_memory_index_search_without_runtime() {
        let registry = SearchRegistry::new(books());

        let (first, second) = std::thread::scope(|scope| {
            let a = scope.spawn(|| registry.start_search("quick fox", "books").unwrap());
            let b = scope.spawn(|| registry.start_search("Quick Fox ", "books").unwrap());
            (a.join().unwrap(), b.join().unwrap())
        });

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.status(), SearchStatus::Ready);
        let result = first.result().unwrap().unwrap();
        assert_eq!(uris(&result), vec!["a.txt", "b.txt"]);
    }

    #[tokio::test]
    async fn test_http_search_lifecycle() {
        // ARRANGE
        let catalog = books();
        let app = build_router(catalog.clone(), SearchRegistry::new(catalog));

        // ACT: start, then collect with wait
        let (status, started) = send(&app, post_search("Quick Fox", "books")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(started["subject"], "quick fox@books");
        let hash = started["hash"].as_u64().unwrap();

        let (status, listed) = send(&app, get("/searches")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed["count"], 1);

        let (status, result) = send(&app, get(&format!("/search/{}/result?wait=true&limit=1", hash))).await;

        // ASSERT
        assert_eq!(status, StatusCode::OK);
        assert_eq!(result["status"], "Done");
        assert_eq!(result["total_count"], 2);
        assert_eq!(result["count"], 1);
        assert_eq!(result["results"][0]["uri"], "a.txt");
        assert_eq!(result["results"][0]["title"], "Alpha");

        let (status, _) = send(&app, get(&format!("/search/{}/result", hash))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_http_rejects_bad_query() {
        let catalog = books();
        let app = build_router(catalog.clone(), SearchRegistry::new(catalog));

        let (status, body) = send(&app, post_search("-fox", "books")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "Error");
        assert!(body["hash"].is_null());
    }

    #[tokio::test]
    async fn test_http_status_pending_and_aborted() {
        // ARRANGE
        let (registry, idx_a, _) = setup();
        let app = build_router(registry.catalog().clone(), registry.clone());
        let node = registry.start_search("cat dog", "idxA").unwrap();
        let hash = node.hash_code();
        idx_a.complete("cat", &[]);

        // ACT / ASSERT: still busy
        let (status, body) = send(&app, get(&format!("/search/{}/status", hash))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "Busy");
        assert_eq!(body["parts"]["done"], 1);
        assert_eq!(body["parts"]["total"], 2);
        assert_eq!(body["sub_progress"].as_array().unwrap().len(), 2);

        let (status, _) = send(&app, get(&format!("/search/{}/result", hash))).await;
        assert_eq!(status, StatusCode::ACCEPTED);

        // ACT / ASSERT: aborted
        idx_a.abort("dog", "index offline");
        let (status, body) = send(&app, get(&format!("/search/{}/status", hash))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "Error");
        assert!(body["error"].as_str().unwrap().contains("index offline"));

        let (status, body) = send(&app, get(&format!("/search/{}/result", hash))).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["status"], "Error");

        let (status, _) = send(&app, get("/search/12345/status")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
