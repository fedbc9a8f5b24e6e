//! Ordered phrase resolution over decoded posting lists.
//!
//! The list with the fewest pages drives the join (the first one on ties). Every
//! driver page is looked up in the other lists by binary search; a page where all
//! terms occur is confirmed as soon as one start position `p` of the first term
//! has term `t` at `p + t` for every `t`. Results come out in driver order, which
//! is ascending page order.

use std::borrow::Borrow;

use crate::postings::{Posting, PostingList};

/// Pages containing the terms of `lists` at consecutive positions, in list order.
///
/// A single list yields all of its pages regardless of positions; no lists, or any
/// empty list, yield nothing.
pub fn resolve<L: Borrow<PostingList>>(lists: &[L]) -> Vec<u32> {
    match lists {
        [] => Vec::new(),
        [single] => single.borrow().page_ids().collect(),
        _ => resolve_many(lists),
    }
}

fn resolve_many<L: Borrow<PostingList>>(lists: &[L]) -> Vec<u32> {
    let Some(driver) = driver_index(lists) else {
        return Vec::new();
    };
    let driver_list = lists[driver].borrow();
    if driver_list.is_empty() {
        return Vec::new();
    }

    let mut pages = Vec::new();
    let mut postings: Vec<&Posting> = Vec::with_capacity(lists.len());
    'pages: for candidate in driver_list.entries() {
        postings.clear();
        for (t, list) in lists.iter().enumerate() {
            let posting = if t == driver {
                candidate
            } else {
                match list.borrow().find(candidate.page_id) {
                    Some(posting) => posting,
                    None => continue 'pages,
                }
            };
            postings.push(posting);
        }
        if is_phrase_match(&postings) {
            pages.push(candidate.page_id);
        }
    }
    pages
}

/// Index of the shortest list, the first one among equals.
fn driver_index<L: Borrow<PostingList>>(lists: &[L]) -> Option<usize> {
    lists
        .iter()
        .enumerate()
        .min_by_key(|&(i, list)| (Borrow::<PostingList>::borrow(list).len(), i))
        .map(|(i, _)| i)
}

/// Whether the postings of consecutive terms in one page line up: some position
/// `p` of the first term has `p + t` among the positions of term `t`.
pub fn is_phrase_match(postings: &[&Posting]) -> bool {
    let Some((first, rest)) = postings.split_first() else {
        return false;
    };
    first.positions.iter().any(|&start| {
        rest.iter().enumerate().all(|(i, posting)| {
            start
                .checked_add(i as u32 + 1)
                .is_some_and(|want| posting.positions.binary_search(&want).is_ok())
        })
    })
}
