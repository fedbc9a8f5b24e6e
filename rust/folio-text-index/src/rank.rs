//! Scoring of query results.
//!
//! For every page in any of the term lists:
//!
//! ```text
//! score = 1.0 * sum(term_freq)
//!       + 2.0 * sum over adjacent terms (t, t+1) of 1 / (1 + min |pos_t - pos_t+1|)
//!       + 5.0 if the page is a phrase hit
//! ```
//!
//! Hits are ordered by score descending, then page id ascending.

use std::{borrow::Borrow, cmp::Ordering};

use ahash::AHashSet;

use crate::{
    boolean,
    postings::{Posting, PostingList},
};

const FREQ_WEIGHT: f64 = 1.0;
const PROXIMITY_WEIGHT: f64 = 2.0;
const PHRASE_BONUS: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedHit {
    pub page_id: u32,
    pub score: f64,
}

/// Scores every page of `lists`. Pages with a zero score are dropped.
pub fn rank<L: Borrow<PostingList>>(lists: &[L], phrase_pages: &[u32]) -> Vec<RankedHit> {
    rank_pages(lists, phrase_pages, candidate_pages(&boolean::union_all(lists)))
}

/// Like [`rank`], restricted to pages where every term occurs.
pub fn rank_all_terms<L: Borrow<PostingList>>(
    lists: &[L],
    phrase_pages: &[u32],
) -> Vec<RankedHit> {
    rank_pages(
        lists,
        phrase_pages,
        candidate_pages(&boolean::intersect_all(lists)),
    )
}

/// Distinct page ids of a merged list. Lists may repeat a page id.
fn candidate_pages(merged: &PostingList) -> Vec<u32> {
    let mut pages: Vec<u32> = merged.page_ids().collect();
    pages.sort_unstable();
    pages.dedup();
    pages
}

fn rank_pages<L: Borrow<PostingList>>(
    lists: &[L],
    phrase_pages: &[u32],
    pages: Vec<u32>,
) -> Vec<RankedHit> {
    let phrase: AHashSet<u32> = phrase_pages.iter().copied().collect();
    let mut hits: Vec<RankedHit> = pages
        .into_iter()
        .filter_map(|page_id| {
            let postings: Vec<Option<&Posting>> =
                lists.iter().map(|list| list.borrow().find(page_id)).collect();
            let freq: f64 = postings
                .iter()
                .flatten()
                .map(|p| p.term_freq as f64)
                .sum();
            let proximity: f64 = postings
                .windows(2)
                .filter_map(|pair| match pair {
                    [Some(a), Some(b)] => min_distance(&a.positions, &b.positions),
                    _ => None,
                })
                .map(|d| 1.0 / (1.0 + d as f64))
                .sum();
            let bonus = if phrase.contains(&page_id) {
                PHRASE_BONUS
            } else {
                0.0
            };
            (freq > 0.0 || proximity > 0.0 || bonus > 0.0).then(|| RankedHit {
                page_id,
                score: FREQ_WEIGHT * freq + PROXIMITY_WEIGHT * proximity + bonus,
            })
        })
        .collect();
    hits.sort_by(compare_hits);
    hits
}

fn compare_hits(a: &RankedHit, b: &RankedHit) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then(a.page_id.cmp(&b.page_id))
}

/// Smallest distance between a position of `a` and one of `b`, both ascending.
fn min_distance(a: &[u32], b: &[u32]) -> Option<u32> {
    let (mut i, mut j) = (0, 0);
    let mut best = None;
    while i < a.len() && j < b.len() {
        let d = a[i].abs_diff(b[j]);
        best = Some(best.map_or(d, |best: u32| best.min(d)));
        if a[i] < b[j] {
            i += 1;
        } else {
            j += 1;
        }
    }
    best
}

/// A window over ranked results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResultPage {
    pub offset: usize,
    /// Zero means no limit.
    pub limit: usize,
}

impl ResultPage {
    pub fn new(offset: usize, limit: usize) -> ResultPage {
        ResultPage { offset, limit }
    }

    pub fn apply<T>(&self, items: Vec<T>) -> Vec<T> {
        let items = items.into_iter().skip(self.offset);
        if self.limit == 0 {
            items.collect()
        } else {
            items.take(self.limit).collect()
        }
    }
}
