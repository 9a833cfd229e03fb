//! Query tree model.
//!
//! The rewriter works on an already parsed query. This module holds the small,
//! closed set of node types it understands:
//!
//! ```text
//! ExpandedQuery
//!   ├─ user_query: UserQuery ── Query(BooleanQuery) | MatchAll
//!   ├─ boost_up_queries / boost_down_queries: Option<Vec<BoostQuery>>
//!   └─ filter_queries: Option<Vec<FilterQuery>>
//!
//! BooleanQuery ──▶ BooleanClause ── Disjunction(DisjunctionMaxQuery) | Boolean(BooleanQuery)
//! DisjunctionMaxQuery ──▶ DisjunctionClause ── Term(Term) | Boolean(BooleanQuery)
//! ```
//!
//! A disjunction groups alternative clauses that occupy a single logical
//! position of the query (for example a term and its synonyms).
//!
//! ## Handles
//!
//! Every `Term` gets a process-unique [`TermId`] when it is constructed. Cloning
//! a term keeps its id, which is what makes snapshots useful: the rewriter hands
//! instructions *copies* of the matched terms, and instructions use the id to
//! find (or delete) the live term in the tree. Ids never get reused, so a
//! snapshot of a deleted term simply finds nothing.
//!
//! Boolean and disjunction nodes carry a [`NodeId`] the same way. Traversal
//! code addresses nodes through key paths ([`BooleanQuery::node_by_keys`])
//! that are resolved from the root on every access, so no borrow of the tree is
//! held while an instruction mutates it, and a clause pruned by an instruction
//! does not shift the walk onto the wrong sibling.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_TERM_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque handle identifying a [`Term`] across snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TermId(u64);

impl TermId {
    fn next() -> Self {
        TermId(NEXT_TERM_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Opaque handle identifying a boolean or disjunction node; kept by clones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    fn next() -> Self {
        NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Identity of any node, stable while its siblings are added or pruned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKey {
    Node(NodeId),
    Term(TermId),
}

/// A leaf of the query tree: an optional field name and a text value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Term {
    id: TermId,
    pub field: Option<String>,
    pub value: String,
    /// Set for terms that were added by rewriting rather than typed by the user.
    pub generated: bool,
}

impl Term {
    pub fn new(value: impl Into<String>) -> Self {
        Term { id: TermId::next(), field: None, value: value.into(), generated: false }
    }

    pub fn with_field(field: impl Into<String>, value: impl Into<String>) -> Self {
        Term { id: TermId::next(), field: Some(field.into()), value: value.into(), generated: false }
    }

    /// A term produced by a rewrite instruction.
    pub fn generated(field: Option<&str>, value: impl Into<String>) -> Self {
        Term { id: TermId::next(), field: field.map(str::to_string), value: value.into(), generated: true }
    }

    pub fn id(&self) -> TermId {
        self.id
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) => write!(f, "{}:{}", field, self.value),
            None => f.write_str(&self.value),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Occur {
    #[default]
    Should,
    Must,
    MustNot,
}

impl Occur {
    fn prefix(self) -> &'static str {
        match self {
            Occur::Should => "",
            Occur::Must => "+",
            Occur::MustNot => "-",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BooleanClause {
    Disjunction(DisjunctionMaxQuery),
    Boolean(BooleanQuery),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DisjunctionClause {
    Term(Term),
    Boolean(BooleanQuery),
}

/// A boolean scope: the unit over which one position sequence is built.
#[derive(Debug, Clone, PartialEq)]
pub struct BooleanQuery {
    id: NodeId,
    pub occur: Occur,
    pub clauses: Vec<BooleanClause>,
    pub generated: bool,
}

/// Alternatives sharing one logical position.
#[derive(Debug, Clone, PartialEq)]
pub struct DisjunctionMaxQuery {
    id: NodeId,
    pub occur: Occur,
    pub clauses: Vec<DisjunctionClause>,
    pub generated: bool,
}

impl BooleanQuery {
    pub fn new(occur: Occur) -> Self {
        BooleanQuery { id: NodeId::next(), occur, clauses: Vec::new(), generated: false }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    /// One `Should` disjunction per value, each holding a single term.
    ///
    /// This is a construction helper for embedders and tests, not a query parser.
    pub fn from_terms(values: &[&str]) -> Self {
        let mut query = BooleanQuery::new(Occur::Should);
        for value in values {
            query.push_disjunction(DisjunctionMaxQuery::of_terms(&[*value]));
        }
        query
    }

    pub fn push_disjunction(&mut self, dmq: DisjunctionMaxQuery) {
        self.clauses.push(BooleanClause::Disjunction(dmq));
    }

    pub fn push_boolean(&mut self, bq: BooleanQuery) {
        self.clauses.push(BooleanClause::Boolean(bq));
    }

    /// True when no term is reachable from this node.
    pub fn is_empty(&self) -> bool {
        self.clauses.iter().all(|clause| match clause {
            BooleanClause::Disjunction(dmq) => dmq.is_empty(),
            BooleanClause::Boolean(bq) => bq.is_empty(),
        })
    }

    /// Resolve an index path starting at this node.
    ///
    /// ```text
    /// []        -> this boolean query
    /// [1]       -> clause 1 (a disjunction or nested boolean)
    /// [1, 0]    -> clause 0 of that node
    /// ```
    pub fn node_at(&self, path: &[usize]) -> Option<NodeRef<'_>> {
        path.iter().try_fold(NodeRef::Boolean(self), |node, &index| node.child(index))
    }

    /// Resolve a path of node keys starting at this node. Unlike index paths,
    /// key paths stay valid when earlier siblings are pruned.
    pub fn node_by_keys(&self, path: &[NodeKey]) -> Option<NodeRef<'_>> {
        path.iter().try_fold(NodeRef::Boolean(self), |node, &key| node.child_by_key(key))
    }

    /// All terms reachable from this node, in tree order.
    pub fn terms(&self) -> Vec<&Term> {
        let mut out = Vec::new();
        collect_terms(NodeRef::Boolean(self), &mut out);
        out
    }

    pub fn find_term(&self, id: TermId) -> Option<&Term> {
        self.terms().into_iter().find(|t| t.id == id)
    }

    /// Remove the term with `id` and prune the disjunctions and nested boolean
    /// clauses that became empty because of it. This node itself is kept even
    /// when it ends up without clauses.
    pub fn remove_term(&mut self, id: TermId) -> bool {
        let removed = self.clauses.iter_mut().any(|clause| match clause {
            BooleanClause::Disjunction(dmq) => dmq.remove_term(id),
            BooleanClause::Boolean(bq) => bq.remove_term(id),
        });
        if removed {
            self.clauses.retain(|clause| match clause {
                BooleanClause::Disjunction(dmq) => !dmq.clauses.is_empty(),
                BooleanClause::Boolean(bq) => !bq.clauses.is_empty(),
            });
        }
        removed
    }

    /// Add `term` as a new alternative next to the term with `id`.
    pub fn add_to_disjunction_of(&mut self, id: TermId, term: Term) -> Result<(), Term> {
        let mut pending = Some(term);
        for clause in &mut self.clauses {
            let Some(term) = pending.take() else { break };
            pending = match clause {
                BooleanClause::Disjunction(dmq) => dmq.add_to_disjunction_of(id, term).err(),
                BooleanClause::Boolean(bq) => bq.add_to_disjunction_of(id, term).err(),
            };
        }
        match pending {
            Some(term) => Err(term),
            None => Ok(()),
        }
    }

    fn fmt_clauses(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, clause) in self.clauses.iter().enumerate() {
            if idx > 0 {
                f.write_str(" ")?;
            }
            match clause {
                BooleanClause::Disjunction(dmq) => write!(f, "{}{}", dmq.occur.prefix(), dmq)?,
                BooleanClause::Boolean(bq) => write!(f, "{}({})", bq.occur.prefix(), bq)?,
            }
        }
        Ok(())
    }
}

impl Default for BooleanQuery {
    fn default() -> Self {
        BooleanQuery::new(Occur::Should)
    }
}

impl fmt::Display for BooleanQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_clauses(f)
    }
}

impl DisjunctionMaxQuery {
    pub fn new(occur: Occur) -> Self {
        DisjunctionMaxQuery { id: NodeId::next(), occur, clauses: Vec::new(), generated: false }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn of_terms(values: &[&str]) -> Self {
        let mut dmq = DisjunctionMaxQuery::new(Occur::Should);
        for value in values {
            dmq.push_term(Term::new(*value));
        }
        dmq
    }

    pub fn push_term(&mut self, term: Term) {
        self.clauses.push(DisjunctionClause::Term(term));
    }

    pub fn push_boolean(&mut self, bq: BooleanQuery) {
        self.clauses.push(DisjunctionClause::Boolean(bq));
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.iter().all(|clause| match clause {
            DisjunctionClause::Term(_) => false,
            DisjunctionClause::Boolean(bq) => bq.is_empty(),
        })
    }

    fn remove_term(&mut self, id: TermId) -> bool {
        if let Some(idx) = self.clauses.iter().position(|c| matches!(c, DisjunctionClause::Term(t) if t.id == id)) {
            self.clauses.remove(idx);
            return true;
        }
        let removed = self.clauses.iter_mut().any(|clause| match clause {
            DisjunctionClause::Boolean(bq) => bq.remove_term(id),
            DisjunctionClause::Term(_) => false,
        });
        if removed {
            self.clauses.retain(|clause| match clause {
                DisjunctionClause::Boolean(bq) => !bq.clauses.is_empty(),
                DisjunctionClause::Term(_) => true,
            });
        }
        removed
    }

    fn add_to_disjunction_of(&mut self, id: TermId, term: Term) -> Result<(), Term> {
        if self.clauses.iter().any(|c| matches!(c, DisjunctionClause::Term(t) if t.id == id)) {
            self.push_term(term);
            return Ok(());
        }
        let mut pending = Some(term);
        for clause in &mut self.clauses {
            if let DisjunctionClause::Boolean(bq) = clause {
                let Some(term) = pending.take() else { break };
                pending = bq.add_to_disjunction_of(id, term).err();
            }
        }
        match pending {
            Some(term) => Err(term),
            None => Ok(()),
        }
    }
}

impl fmt::Display for DisjunctionMaxQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let single = self.clauses.len() == 1;
        if !single {
            f.write_str("(")?;
        }
        for (idx, clause) in self.clauses.iter().enumerate() {
            if idx > 0 {
                f.write_str(" | ")?;
            }
            match clause {
                DisjunctionClause::Term(term) => write!(f, "{}", term)?,
                DisjunctionClause::Boolean(bq) => write!(f, "({})", bq)?,
            }
        }
        if !single {
            f.write_str(")")?;
        }
        Ok(())
    }
}

impl Default for DisjunctionMaxQuery {
    fn default() -> Self {
        DisjunctionMaxQuery::new(Occur::Should)
    }
}

/// Borrowed view over one node of the closed node set.
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    Boolean(&'a BooleanQuery),
    Disjunction(&'a DisjunctionMaxQuery),
    Term(&'a Term),
}

impl<'a> NodeRef<'a> {
    pub fn child(self, index: usize) -> Option<NodeRef<'a>> {
        match self {
            NodeRef::Boolean(bq) => bq.clauses.get(index).map(|clause| match clause {
                BooleanClause::Disjunction(dmq) => NodeRef::Disjunction(dmq),
                BooleanClause::Boolean(bq) => NodeRef::Boolean(bq),
            }),
            NodeRef::Disjunction(dmq) => dmq.clauses.get(index).map(|clause| match clause {
                DisjunctionClause::Term(term) => NodeRef::Term(term),
                DisjunctionClause::Boolean(bq) => NodeRef::Boolean(bq),
            }),
            NodeRef::Term(_) => None,
        }
    }

    pub fn key(self) -> NodeKey {
        match self {
            NodeRef::Boolean(bq) => NodeKey::Node(bq.id),
            NodeRef::Disjunction(dmq) => NodeKey::Node(dmq.id),
            NodeRef::Term(term) => NodeKey::Term(term.id),
        }
    }

    /// Keys of the direct children, in clause order.
    pub fn child_keys(self) -> Vec<NodeKey> {
        let mut keys = Vec::new();
        while let Some(child) = self.child(keys.len()) {
            keys.push(child.key());
        }
        keys
    }

    /// The direct child with `key`, wherever it sits now.
    pub fn child_by_key(self, key: NodeKey) -> Option<NodeRef<'a>> {
        let mut index = 0;
        while let Some(child) = self.child(index) {
            if child.key() == key {
                return Some(child);
            }
            index += 1;
        }
        None
    }
}

fn collect_terms<'a>(node: NodeRef<'a>, out: &mut Vec<&'a Term>) {
    match node {
        NodeRef::Term(term) => out.push(term),
        _ => {
            let mut idx = 0;
            while let Some(child) = node.child(idx) {
                collect_terms(child, out);
                idx += 1;
            }
        }
    }
}

/// The query typed by the user, or the match-everything placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum UserQuery {
    Query(BooleanQuery),
    MatchAll { generated: bool },
}

impl fmt::Display for UserQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserQuery::Query(bq) => write!(f, "{}", bq),
            UserQuery::MatchAll { .. } => f.write_str("*:*"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoostQuery {
    pub query: BooleanQuery,
    pub boost: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterQuery {
    pub query: BooleanQuery,
}

/// The user query together with the auxiliary clauses rewriting can attach.
///
/// The auxiliary lists stay `None` until the first clause of their kind is
/// added.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpandedQuery {
    pub user_query: UserQuery,
    pub boost_up_queries: Option<Vec<BoostQuery>>,
    pub boost_down_queries: Option<Vec<BoostQuery>>,
    pub filter_queries: Option<Vec<FilterQuery>>,
}

impl ExpandedQuery {
    pub fn new(user_query: BooleanQuery) -> Self {
        ExpandedQuery {
            user_query: UserQuery::Query(user_query),
            boost_up_queries: None,
            boost_down_queries: None,
            filter_queries: None,
        }
    }

    pub fn user_boolean_query(&self) -> Option<&BooleanQuery> {
        match &self.user_query {
            UserQuery::Query(bq) => Some(bq),
            UserQuery::MatchAll { .. } => None,
        }
    }

    pub fn user_boolean_query_mut(&mut self) -> Option<&mut BooleanQuery> {
        match &mut self.user_query {
            UserQuery::Query(bq) => Some(bq),
            UserQuery::MatchAll { .. } => None,
        }
    }

    pub fn find_term(&self, id: TermId) -> Option<&Term> {
        self.user_boolean_query()?.find_term(id)
    }

    /// Remove a term from the user query. Returns false when it is not there
    /// (any more).
    pub fn remove_term(&mut self, id: TermId) -> bool {
        self.user_boolean_query_mut().is_some_and(|bq| bq.remove_term(id))
    }

    /// Add `term` to the disjunction that directly holds the term with `id`.
    pub fn add_to_disjunction_of(&mut self, id: TermId, term: Term) -> bool {
        self.user_boolean_query_mut().is_some_and(|bq| bq.add_to_disjunction_of(id, term).is_ok())
    }

    pub fn add_boost_up_query(&mut self, query: BoostQuery) {
        self.boost_up_queries.get_or_insert_with(Vec::new).push(query);
    }

    pub fn add_boost_down_query(&mut self, query: BoostQuery) {
        self.boost_down_queries.get_or_insert_with(Vec::new).push(query);
    }

    pub fn add_filter_query(&mut self, query: FilterQuery) {
        self.filter_queries.get_or_insert_with(Vec::new).push(query);
    }

    /// Whether boost-up or filter queries are present. An emptied user query
    /// is replaced by match-all only then; boost-down queries alone keep it empty.
    pub fn needs_match_all_when_empty(&self) -> bool {
        self.boost_up_queries.is_some() || self.filter_queries.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nested() -> BooleanQuery {
        // a (b | (c d)) e
        let inner = BooleanQuery::from_terms(&["c", "d"]);
        let mut dmq = DisjunctionMaxQuery::of_terms(&["b"]);
        dmq.push_boolean(inner);

        let mut root = BooleanQuery::new(Occur::Should);
        root.push_disjunction(DisjunctionMaxQuery::of_terms(&["a"]));
        root.push_disjunction(dmq);
        root.push_disjunction(DisjunctionMaxQuery::of_terms(&["e"]));
        root
    }

    #[test]
    fn display_is_compact() {
        assert_eq!(nested().to_string(), "a (b | (c d)) e");

        let mut bq = BooleanQuery::new(Occur::Should);
        let mut must = DisjunctionMaxQuery::of_terms(&["x", "y"]);
        must.occur = Occur::Must;
        bq.push_disjunction(must);
        let mut not = DisjunctionMaxQuery::new(Occur::MustNot);
        not.push_term(Term::with_field("f", "z"));
        bq.push_disjunction(not);
        assert_eq!(bq.to_string(), "+(x | y) -f:z");
    }

    #[test]
    fn node_at_follows_index_paths() {
        let root = nested();
        assert!(matches!(root.node_at(&[]), Some(NodeRef::Boolean(_))));
        assert!(matches!(root.node_at(&[1]), Some(NodeRef::Disjunction(_))));
        assert!(matches!(root.node_at(&[1, 1]), Some(NodeRef::Boolean(_))));
        match root.node_at(&[1, 1, 0, 0]) {
            Some(NodeRef::Term(t)) => assert_eq!(t.value, "c"),
            other => panic!("unexpected node {:?}", other),
        }
        assert!(root.node_at(&[3]).is_none());
        assert!(root.node_at(&[0, 0, 0]).is_none());
    }

    #[test]
    fn key_paths_survive_pruning_of_earlier_siblings() {
        let mut root = nested();
        let keys = NodeRef::Boolean(&root).child_keys();
        assert_eq!(keys.len(), 3);
        let e = root.terms()[4].id();
        let path = [keys[2], NodeKey::Term(e)];
        assert!(matches!(root.node_by_keys(&path), Some(NodeRef::Term(t)) if t.value == "e"));

        // a (b | (c d)) e  ->  a e: the middle disjunction is gone, "e" moved to index 1
        let ids: Vec<TermId> = root.terms().iter().map(|t| t.id()).collect();
        for id in &ids[1..4] {
            root.remove_term(*id);
        }
        assert_eq!(root.to_string(), "a e");
        assert!(root.node_by_keys(&[keys[1]]).is_none());
        assert!(matches!(root.node_by_keys(&path), Some(NodeRef::Term(t)) if t.value == "e"));
        assert!(matches!(root.node_at(&[1, 0]), Some(NodeRef::Term(t)) if t.value == "e"));
        assert_eq!(NodeRef::Boolean(&root).child_keys(), vec![keys[0], keys[2]]);
        assert_eq!(root.clone().id(), root.id());
    }

    #[test]
    fn clones_share_ids_and_new_terms_do_not() {
        let a = Term::new("a");
        let b = Term::new("a");
        assert_eq!(a.clone().id(), a.id());
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn remove_term_prunes_emptied_clauses() {
        let mut root = nested();
        let ids: Vec<TermId> = root.terms().iter().map(|t| t.id()).collect();

        // removing "c" and "d" empties the nested boolean, which is pruned from the disjunction
        assert!(root.remove_term(ids[2]));
        assert!(root.remove_term(ids[3]));
        assert_eq!(root.to_string(), "a b e");

        assert!(root.remove_term(ids[1]));
        assert_eq!(root.to_string(), "a e");
        assert!(!root.remove_term(ids[1]));

        assert!(root.remove_term(ids[0]));
        assert!(root.remove_term(ids[4]));
        assert!(root.clauses.is_empty());
        assert!(root.is_empty());
    }

    #[test]
    fn add_to_disjunction_finds_nested_terms() {
        let mut query = ExpandedQuery::new(nested());
        let d = query.user_boolean_query().unwrap().terms()[3].id();
        assert!(query.add_to_disjunction_of(d, Term::generated(None, "dd")));
        assert_eq!(query.user_query.to_string(), "a (b | (c (d | dd))) e");

        let gone = Term::new("gone");
        assert!(!query.add_to_disjunction_of(gone.id(), Term::new("x")));
    }

    #[test]
    fn auxiliary_lists_start_absent() {
        let mut query = ExpandedQuery::new(BooleanQuery::from_terms(&["a"]));
        assert!(!query.needs_match_all_when_empty());
        query.add_boost_down_query(BoostQuery { query: BooleanQuery::from_terms(&["d"]), boost: 1.0 });
        assert!(!query.needs_match_all_when_empty());
        query.add_filter_query(FilterQuery { query: BooleanQuery::from_terms(&["f"]) });
        assert!(query.needs_match_all_when_empty());
        assert_eq!(query.filter_queries.as_ref().map(Vec::len), Some(1));
    }
}
