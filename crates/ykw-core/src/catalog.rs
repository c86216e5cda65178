//! Catalog walk: classroom -> chapters -> video leaves.
//!
//! Chapter entries come in two shapes: a section carrying a nested
//! `leaf_list`, or a bare leaf at the section level. Only video-typed leaves
//! (`leaf_type == 0`) are eligible for watch sessions.

use crate::api::{ApiClient, ApiError, ChapterTree};

/// Leaf type tag for videos.
pub const VIDEO_LEAF_TYPE: i64 = 0;

/// A video leaf eligible for a watch session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafRef {
    pub id: i64,
    pub name: String,
}

/// Walk a chapter tree and keep video-typed leaves, in course order.
pub fn video_leaves(tree: &ChapterTree) -> Vec<LeafRef> {
    let mut leaves = Vec::new();

    for chapter in &tree.course_chapter {
        tracing::info!(id = chapter.id, name = %chapter.name, "chapter");

        for item in &chapter.section_leaf_list {
            if let Some(leaf_list) = &item.leaf_list {
                tracing::info!(section = item.id, name = %item.name, "section");
                for leaf in leaf_list {
                    tracing::debug!(id = leaf.id, name = %leaf.name, leaf_type = leaf.leaf_type, "leaf");
                    if leaf.leaf_type == VIDEO_LEAF_TYPE {
                        leaves.push(LeafRef {
                            id: leaf.id,
                            name: leaf.name.clone(),
                        });
                    }
                }
            } else if item.leaf_type == Some(VIDEO_LEAF_TYPE) {
                leaves.push(LeafRef {
                    id: item.id,
                    name: item.name.clone(),
                });
            }
        }
    }

    leaves
}

/// Fetch the classroom metadata and chapter tree, returning the video leaves.
pub async fn collect_video_leaves(
    api: &ApiClient,
    classroom_id: i64,
) -> Result<Vec<LeafRef>, ApiError> {
    let classroom = api.classroom(classroom_id).await?;
    tracing::info!(
        course = %classroom.course_name,
        name = %classroom.name,
        teacher = classroom.teacher_name.as_deref().unwrap_or("-"),
        "classroom"
    );

    let tree = api
        .course_chapter(classroom_id, &classroom.course_sign, classroom.uv_id)
        .await?;
    Ok(video_leaves(&tree))
}
