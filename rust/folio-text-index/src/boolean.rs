//! Boolean combination of posting lists.
//!
//! Both operations are linear merges over page-sorted inputs. The combined postings
//! carry the summed term frequency of their inputs and no positions. Ranking takes
//! its candidate pages from these folds.

use std::{borrow::Borrow, cmp::Ordering};

use crate::postings::{Posting, PostingList};

fn merged(page_id: u32, term_freq: u32) -> Posting {
    Posting {
        page_id,
        term_freq,
        positions: Vec::new(),
    }
}

/// Pages present in both `a` and `b` (AND).
pub fn intersect(a: &PostingList, b: &PostingList) -> PostingList {
    let (a, b) = (a.entries(), b.entries());
    let mut out = Vec::with_capacity(a.len().min(b.len()));
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].page_id.cmp(&b[j].page_id) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                out.push(merged(
                    a[i].page_id,
                    a[i].term_freq.saturating_add(b[j].term_freq),
                ));
                i += 1;
                j += 1;
            }
        }
    }
    PostingList::new(out)
}

/// Pages present in `a` or `b` (OR).
pub fn union(a: &PostingList, b: &PostingList) -> PostingList {
    let (a, b) = (a.entries(), b.entries());
    let mut out = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() || j < b.len() {
        let order = match (a.get(i), b.get(j)) {
            (Some(x), Some(y)) => x.page_id.cmp(&y.page_id),
            (Some(_), None) => Ordering::Less,
            _ => Ordering::Greater,
        };
        match order {
            Ordering::Less => {
                out.push(merged(a[i].page_id, a[i].term_freq));
                i += 1;
            }
            Ordering::Greater => {
                out.push(merged(b[j].page_id, b[j].term_freq));
                j += 1;
            }
            Ordering::Equal => {
                out.push(merged(
                    a[i].page_id,
                    a[i].term_freq.saturating_add(b[j].term_freq),
                ));
                i += 1;
                j += 1;
            }
        }
    }
    PostingList::new(out)
}

/// Folds [`intersect`] over all lists; no lists yield an empty list.
pub fn intersect_all<L: Borrow<PostingList>>(lists: &[L]) -> PostingList {
    match lists.split_first() {
        None => PostingList::empty(),
        Some((first, rest)) => rest
            .iter()
            .fold(strip(first.borrow()), |acc, list| intersect(&acc, list.borrow())),
    }
}

/// Folds [`union`] over all lists.
pub fn union_all<L: Borrow<PostingList>>(lists: &[L]) -> PostingList {
    lists
        .iter()
        .fold(PostingList::empty(), |acc, list| union(&acc, list.borrow()))
}

fn strip(list: &PostingList) -> PostingList {
    PostingList::new(
        list.entries()
            .iter()
            .map(|p| merged(p.page_id, p.term_freq))
            .collect(),
    )
}
