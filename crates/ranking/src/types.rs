use model_store::ArticleId;
use scorers::compare_scores;

/// One article after fusion (and possibly diversity selection)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedCandidate {
    pub article_id: ArticleId,
    pub score: f32,
}

impl RankedCandidate {
    pub fn new(article_id: ArticleId, score: f32) -> Self {
        Self { article_id, score }
    }
}

/// Sort best-first with the shared article-id tie-break
pub fn sort_ranked(candidates: &mut [RankedCandidate]) {
    candidates.sort_by(|a, b| compare_scores(a.score, a.article_id, b.score, b.article_id));
}
