// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Thread-list assembly and reply traversal.
//!
//! The RPC exposes a board's posts as preloaded first pages plus page-cid
//! chain heads, by sort key. The moderation rules need one fully ordered
//! thread list in active order, which is assembled here; the deleted-reply
//! scan is a breadth-first walk of a thread's reply subtree.

use std::collections::{HashSet, VecDeque};

use bm_adapters::{RpcClient, RpcError};
use bm_core::{Page, PostsView, Thread};

/// Assemble the board's full thread list in active order.
///
/// An `active` page-cid chain is already in active order and is used as
/// is. Otherwise the first preloaded page (smallest sort key, for a
/// deterministic pick) is walked through its continuation chain and the
/// result re-sorted. A board with neither has no posts.
pub async fn collect_threads(
    client: &dyn RpcClient,
    address: &str,
    posts: &PostsView,
) -> Result<Vec<Thread>, RpcError> {
    if let Some(head) = posts.page_cids.get("active") {
        return walk_chain(client, address, Vec::new(), Some(head.clone())).await;
    }

    let Some(first) = preloaded_page(posts) else {
        return Ok(Vec::new());
    };
    let mut threads =
        walk_chain(client, address, first.comments.clone(), first.next_cid.clone()).await?;
    threads.sort_by(Thread::active_order);
    Ok(threads)
}

/// Collect the cids of every deleted node in a thread's reply subtree.
///
/// Preloaded reply pages are scanned directly; page-cid heads and
/// continuation cids are fetched through the parent comment. A visited set
/// of `"{parent}:{page_cid}"` pairs guards against revisits.
pub async fn collect_deleted_replies(
    client: &dyn RpcClient,
    address: &str,
    thread: &Thread,
) -> Result<Vec<String>, RpcError> {
    let mut deleted = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut to_scan: VecDeque<(String, Page)> = VecDeque::new();
    let mut to_fetch: VecDeque<(String, String)> = VecDeque::new();
    let mut visited: HashSet<String> = HashSet::new();

    enqueue_replies(thread, &mut to_scan, &mut to_fetch);

    loop {
        while let Some((parent, page)) = to_scan.pop_front() {
            if let Some(next) = &page.next_cid {
                to_fetch.push_back((parent.clone(), next.clone()));
            }
            for comment in &page.comments {
                if comment.deleted && seen.insert(comment.cid.clone()) {
                    deleted.push(comment.cid.clone());
                }
                enqueue_replies(comment, &mut to_scan, &mut to_fetch);
            }
        }

        let Some((parent, page_cid)) = to_fetch.pop_front() else {
            break;
        };
        if !visited.insert(format!("{parent}:{page_cid}")) {
            continue;
        }
        let page = client.get_page(address, &page_cid, Some(&parent)).await?;
        to_scan.push_back((parent, page));
    }

    Ok(deleted)
}

fn enqueue_replies(
    comment: &Thread,
    to_scan: &mut VecDeque<(String, Page)>,
    to_fetch: &mut VecDeque<(String, String)>,
) {
    let Some(replies) = &comment.replies else {
        return;
    };
    for page in replies.pages.values() {
        to_scan.push_back((comment.cid.clone(), page.clone()));
    }
    for page_cid in replies.page_cids.values() {
        to_fetch.push_back((comment.cid.clone(), page_cid.clone()));
    }
}

async fn walk_chain(
    client: &dyn RpcClient,
    address: &str,
    mut threads: Vec<Thread>,
    mut next: Option<String>,
) -> Result<Vec<Thread>, RpcError> {
    while let Some(cid) = next {
        let page = client.get_page(address, &cid, None).await?;
        threads.extend(page.comments);
        next = page.next_cid;
    }
    Ok(threads)
}

fn preloaded_page(posts: &PostsView) -> Option<&Page> {
    posts
        .pages
        .iter()
        .min_by(|(a, _), (b, _)| a.cmp(b))
        .map(|(_, page)| page)
}

#[cfg(test)]
#[path = "paginator_tests.rs"]
mod tests;
