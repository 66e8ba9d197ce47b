//! Content lifecycle service.
//!
//! The single write path for nodes: every create, update, move, delete,
//! restore, and purge keeps the identity row and the kind payload
//! consistent, triggers the joint-permission rebuild for its blast
//! radius, and emits a change event for the search collaborator. A
//! structural write whose rebuild cannot complete inline lands in the
//! rebuild outbox, so "write succeeded but permissions stay stale" is
//! not a reachable end state.

use std::sync::Arc;

use tracing::{debug, warn};

use folio_core::config::RebuildConfig;
use folio_core::error::AppError;
use folio_core::events::{DomainEvent, EntityEvent, EventSink};
use folio_core::result::AppResult;
use folio_core::types::pagination::{PageRequest, PageResponse};
use folio_database::repositories::node::NodeRepository;
use folio_database::repositories::outbox::OutboxRepository;
use folio_database::repositories::role::RoleRepository;
use folio_database::repositories::shelf::ShelfRepository;
use folio_entity::node::{ContentNode, NewNode, Node, NodeKind, NodePayload, NodeRef};
use folio_entity::permission::{Action, Capability};
use folio_permission::hierarchy::HierarchyResolver;
use folio_permission::{JointPermissionBuilder, PermissionApplicator};

use super::html;
use super::input::NodeInput;
use super::refs::ReferenceValidator;
use super::slug;
use crate::context::RequestContext;

/// Orchestrates the content node lifecycle.
#[derive(Clone)]
pub struct ContentService {
    nodes: NodeRepository,
    shelves: ShelfRepository,
    roles: RoleRepository,
    hierarchy: HierarchyResolver,
    builder: JointPermissionBuilder,
    applicator: PermissionApplicator,
    outbox: OutboxRepository,
    refs: ReferenceValidator,
    events: Arc<dyn EventSink>,
    rebuild: RebuildConfig,
}

impl ContentService {
    /// Create a new content service.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        nodes: NodeRepository,
        shelves: ShelfRepository,
        roles: RoleRepository,
        hierarchy: HierarchyResolver,
        builder: JointPermissionBuilder,
        applicator: PermissionApplicator,
        outbox: OutboxRepository,
        events: Arc<dyn EventSink>,
        rebuild: RebuildConfig,
    ) -> Self {
        let refs = ReferenceValidator::new(nodes.clone());
        Self {
            nodes,
            shelves,
            roles,
            hierarchy,
            builder,
            applicator,
            outbox,
            refs,
            events,
            rebuild,
        }
    }

    /// Create a new node of the given kind from a flat attribute bag.
    pub async fn create(
        &self,
        ctx: &RequestContext,
        kind: NodeKind,
        input: NodeInput,
    ) -> AppResult<Node> {
        let name = input
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| AppError::validation("Name is required"))?
            .to_string();

        self.log_foreign_fields(kind, &input);
        let (book_id, chapter_id) = self.validated_parents(kind, &input).await?;

        // Creation permission comes from the nearest parent's joint rows,
        // or from role defaults when the new node is a root.
        match parent_of(kind, book_id, chapter_id) {
            Some(parent) => self.require(ctx, parent, Action::Create).await?,
            None => self.require_root_create(ctx, kind).await?,
        }

        let scoped = self.nodes.scope(kind);
        let slug = slug::unique_slug(&scoped, &name, None).await?;

        let new = NewNode {
            name,
            slug,
            book_id,
            chapter_id,
            priority: input.priority.unwrap_or(0),
            actor_id: Some(ctx.actor_id()),
        };
        let mut payload = NodePayload::empty(0, kind);
        self.apply_payload_input(&mut payload, &input, false).await?;

        let node = scoped.insert(&new, &payload).await?;
        self.rebuild_node_guaranteed(node.content()).await?;
        self.emit(ctx, EntityEvent::Created {
            node_id: node.content().id,
            kind: kind.as_str().to_string(),
            name: node.content().name.clone(),
        })
        .await;

        Ok(node)
    }

    /// Update a node from a flat attribute bag. Unset attributes keep
    /// their stored values; attributes foreign to the kind are dropped.
    pub async fn update(
        &self,
        ctx: &RequestContext,
        node_ref: NodeRef,
        input: NodeInput,
    ) -> AppResult<Node> {
        let scoped = self.nodes.scope(node_ref.kind);
        let mut node = scoped
            .find_by_id(node_ref.id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("{node_ref} not found")))?;
        self.require(ctx, node_ref, Action::Update).await?;
        self.log_foreign_fields(node_ref.kind, &input);

        let mut payload = scoped.load_payload(&node).await?;

        if let Some(name) = input.name.as_deref().map(str::trim) {
            if name.is_empty() {
                return Err(AppError::validation("Name cannot be empty"));
            }
            if name != node.name {
                node.name = name.to_string();
                node.slug = slug::unique_slug(&scoped, name, Some(node.id)).await?;
            }
        }
        if let Some(priority) = input.priority {
            node.priority = priority;
        }
        node.updated_by = Some(ctx.actor_id());

        self.apply_payload_input(&mut payload, &input, true).await?;

        let saved = scoped.save(&node, &payload).await?;
        self.rebuild_node_guaranteed(&saved).await?;
        self.emit(ctx, EntityEvent::Updated {
            node_id: saved.id,
            kind: saved.kind.as_str().to_string(),
            name: saved.name.clone(),
        })
        .await;

        Ok(Node::from_parts(saved, payload))
    }

    /// Move a chapter to another book, or a page to another book or
    /// chapter. The node's resolved permissions follow its new ancestor
    /// chain once the triggered subtree rebuild lands.
    pub async fn move_node(
        &self,
        ctx: &RequestContext,
        node_ref: NodeRef,
        new_book_id: i64,
        new_chapter_id: Option<i64>,
    ) -> AppResult<Node> {
        if !matches!(node_ref.kind, NodeKind::Chapter | NodeKind::Page) {
            return Err(AppError::validation(format!(
                "Nodes of kind '{}' cannot be moved",
                node_ref.kind
            )));
        }

        let scoped = self.nodes.scope(node_ref.kind);
        let mut node = scoped
            .find_by_id(node_ref.id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("{node_ref} not found")))?;
        self.require(ctx, node_ref, Action::Update).await?;

        let move_input = NodeInput {
            book_id: Some(new_book_id),
            chapter_id: new_chapter_id,
            ..Default::default()
        };
        let (book_id, chapter_id) = self.validated_parents(node_ref.kind, &move_input).await?;
        let target = parent_of(node_ref.kind, book_id, chapter_id)
            .expect("chapters and pages always have a parent");
        self.require(ctx, target, Action::Create).await?;

        node.book_id = book_id;
        node.chapter_id = chapter_id;
        node.updated_by = Some(ctx.actor_id());

        let payload = scoped.load_payload(&node).await?;
        let saved = scoped.save(&node, &payload).await?;

        // A moved chapter drags its pages into the new book.
        if node_ref.kind == NodeKind::Chapter {
            self.nodes
                .reparent_chapter_pages(node_ref.id, new_book_id)
                .await?;
        }

        self.rebuild_subtree_guaranteed(&saved).await?;
        self.emit(ctx, EntityEvent::Moved {
            node_id: saved.id,
            kind: saved.kind.as_str().to_string(),
            book_id: saved.book_id,
            chapter_id: saved.chapter_id,
        })
        .await;

        Ok(Node::from_parts(saved, payload))
    }

    /// Soft-delete a node and its structural subtree. Recoverable with
    /// [`restore`](Self::restore) until purged.
    pub async fn soft_delete(&self, ctx: &RequestContext, node_ref: NodeRef) -> AppResult<()> {
        let scoped = self.nodes.scope(node_ref.kind);
        let node = scoped
            .find_by_id(node_ref.id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("{node_ref} not found")))?;
        self.require(ctx, node_ref, Action::Delete).await?;

        let subtree = self.hierarchy.subtree_refs(&node).await?;
        self.nodes.mark_deleted(&subtree).await?;
        self.rebuild_subtree_guaranteed(&node).await?;
        self.emit(ctx, EntityEvent::SoftDeleted {
            node_id: node.id,
            kind: node.kind.as_str().to_string(),
        })
        .await;
        Ok(())
    }

    /// Restore a soft-deleted node and its subtree.
    pub async fn restore(&self, ctx: &RequestContext, node_ref: NodeRef) -> AppResult<()> {
        let scoped = self.nodes.scope(node_ref.kind);
        let node = scoped
            .find_with_deleted(node_ref.id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("{node_ref} not found")))?;
        if !node.is_deleted() {
            return Err(AppError::validation(format!("{node_ref} is not deleted")));
        }
        self.require(ctx, node_ref, Action::Delete).await?;

        // Restoring into a deleted parent would resurrect an orphan.
        if let Some(parent_ref) = node.parent_ref() {
            let parent = self.nodes.find_by_ref(parent_ref).await?;
            if parent.is_none_or(|p| p.is_deleted()) {
                return Err(AppError::validation(format!(
                    "Cannot restore {node_ref}: its parent is deleted"
                )));
            }
        }

        let subtree = self.hierarchy.subtree_refs(&node).await?;
        self.nodes.clear_deleted(&subtree).await?;
        self.rebuild_subtree_guaranteed(&node).await?;
        self.emit(ctx, EntityEvent::Restored {
            node_id: node.id,
            kind: node.kind.as_str().to_string(),
        })
        .await;
        Ok(())
    }

    /// Permanently remove a soft-deleted node and its subtree, including
    /// payloads, rules, shelf links, and materialized rows.
    pub async fn purge(&self, ctx: &RequestContext, node_ref: NodeRef) -> AppResult<()> {
        let scoped = self.nodes.scope(node_ref.kind);
        let node = scoped
            .find_with_deleted(node_ref.id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("{node_ref} not found")))?;
        if !node.is_deleted() {
            return Err(AppError::validation(format!(
                "{node_ref} must be soft-deleted before it can be purged"
            )));
        }
        self.require(ctx, node_ref, Action::Delete).await?;

        let subtree = self.hierarchy.subtree_refs(&node).await?;
        self.nodes.purge(&subtree).await?;
        self.emit(ctx, EntityEvent::Purged {
            node_id: node.id,
            kind: node.kind.as_str().to_string(),
        })
        .await;
        Ok(())
    }

    /// Load a node the principal may view. Nodes the principal cannot
    /// see read as missing, indistinguishable from nodes that are not
    /// there.
    pub async fn get(
        &self,
        ctx: &RequestContext,
        node_ref: NodeRef,
    ) -> AppResult<Option<Node>> {
        let scoped = self.nodes.scope(node_ref.kind);
        let Some(node) = scoped.get(node_ref.id).await? else {
            return Ok(None);
        };
        if !self
            .applicator
            .can(node_ref, &ctx.principal, Action::View)
            .await?
        {
            return Ok(None);
        }
        Ok(Some(node))
    }

    /// List nodes of a kind visible to the principal.
    pub async fn list(
        &self,
        ctx: &RequestContext,
        kind: NodeKind,
        page: &PageRequest,
    ) -> AppResult<PageResponse<ContentNode>> {
        let filter = self.applicator.restrict(&ctx.principal, Action::View);
        self.nodes.scope(kind).list(page, Some(&filter)).await
    }

    /// The books on a shelf the principal may view, in shelf order.
    pub async fn books_on_shelf(
        &self,
        ctx: &RequestContext,
        shelf_id: i64,
    ) -> AppResult<Vec<ContentNode>> {
        self.require(ctx, NodeRef::new(shelf_id, NodeKind::Shelf), Action::View)
            .await?;
        let mut visible = Vec::new();
        for book in self.shelves.books_for_shelf(shelf_id).await? {
            if self
                .applicator
                .can(book.node_ref(), &ctx.principal, Action::View)
                .await?
            {
                visible.push(book);
            }
        }
        Ok(visible)
    }

    /// Replace the set of books on a shelf. Unknown or deleted book ids
    /// are dropped rather than failing the write.
    pub async fn set_shelf_books(
        &self,
        ctx: &RequestContext,
        shelf_id: i64,
        book_ids: &[i64],
    ) -> AppResult<()> {
        let shelf_ref = NodeRef::new(shelf_id, NodeKind::Shelf);
        self.nodes
            .scope(NodeKind::Shelf)
            .find_by_id(shelf_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("{shelf_ref} not found")))?;
        self.require(ctx, shelf_ref, Action::Update).await?;

        let books = self.nodes.scope(NodeKind::Book);
        let mut valid = Vec::with_capacity(book_ids.len());
        for id in book_ids {
            if books.find_by_id(*id).await?.is_some() {
                valid.push(*id);
            } else {
                debug!(book_id = id, "Dropping unknown book from shelf assignment");
            }
        }
        self.shelves.replace_books(shelf_id, &valid).await
    }

    // -- internals --

    /// Validate the structural parent pointers for a kind, failing with
    /// a validation error before anything is written.
    async fn validated_parents(
        &self,
        kind: NodeKind,
        input: &NodeInput,
    ) -> AppResult<(Option<i64>, Option<i64>)> {
        match kind {
            NodeKind::Shelf | NodeKind::Book => Ok((None, None)),
            NodeKind::Chapter => {
                let book_id = input
                    .book_id
                    .ok_or_else(|| AppError::validation("Chapters require a book"))?;
                self.nodes
                    .scope(NodeKind::Book)
                    .find_by_id(book_id)
                    .await?
                    .ok_or_else(|| {
                        AppError::validation(format!("Book {book_id} does not exist"))
                    })?;
                Ok((Some(book_id), None))
            }
            NodeKind::Page => {
                let book_id = input
                    .book_id
                    .ok_or_else(|| AppError::validation("Pages require a book"))?;
                self.nodes
                    .scope(NodeKind::Book)
                    .find_by_id(book_id)
                    .await?
                    .ok_or_else(|| {
                        AppError::validation(format!("Book {book_id} does not exist"))
                    })?;
                if let Some(chapter_id) = input.chapter_id {
                    let chapter = self
                        .nodes
                        .scope(NodeKind::Chapter)
                        .find_by_id(chapter_id)
                        .await?
                        .ok_or_else(|| {
                            AppError::validation(format!("Chapter {chapter_id} does not exist"))
                        })?;
                    if chapter.book_id != Some(book_id) {
                        return Err(AppError::validation(format!(
                            "Chapter {chapter_id} belongs to a different book"
                        )));
                    }
                    Ok((Some(book_id), Some(chapter_id)))
                } else {
                    Ok((Some(book_id), None))
                }
            }
        }
    }

    /// Apply the payload half of a flat input, filtering description
    /// HTML and degrading invalid optional references to null.
    async fn apply_payload_input(
        &self,
        payload: &mut NodePayload,
        input: &NodeInput,
        is_update: bool,
    ) -> AppResult<()> {
        match payload {
            NodePayload::Container(data) => {
                if let Some(description_html) = &input.description_html {
                    data.description_html = html::filter_description_html(description_html);
                    data.description = html::strip_tags(&data.description_html);
                } else if let Some(description) = &input.description {
                    data.description = description.clone();
                    data.description_html = html::escape_to_paragraph(description);
                }
                if input.default_template_id.is_some() {
                    data.default_template_id = self
                        .refs
                        .validated_template_id(input.default_template_id)
                        .await?;
                }
                if input.cover_image_id.is_some() {
                    data.cover_image_id = self.refs.normalized_external_id(input.cover_image_id);
                }
                if input.sort_rule_id.is_some() {
                    data.sort_rule_id = self.refs.normalized_external_id(input.sort_rule_id);
                }
            }
            NodePayload::Page(data) => {
                if let Some(draft) = input.draft {
                    data.draft = draft;
                }
                if let Some(template) = input.template {
                    data.template = template;
                }
                if let Some(editor) = &input.editor {
                    data.editor = editor.clone();
                }
                let content_changed = input.html.is_some() || input.markdown.is_some();
                if let Some(markdown) = &input.markdown {
                    data.markdown = markdown.clone();
                }
                if let Some(page_html) = &input.html {
                    data.html = page_html.clone();
                    data.text = html::strip_tags(page_html);
                }
                if is_update && content_changed {
                    data.revision_count += 1;
                }
            }
        }
        Ok(())
    }

    /// Require a joint-index grant, failing closed with an authorization
    /// error.
    async fn require(
        &self,
        ctx: &RequestContext,
        node: NodeRef,
        action: Action,
    ) -> AppResult<()> {
        if self.applicator.can(node, &ctx.principal, action).await? {
            Ok(())
        } else {
            Err(AppError::authorization(format!(
                "Not allowed to {action} {node}"
            )))
        }
    }

    /// Root creates (shelves, books) have no parent node to consult, so
    /// the principal's role defaults for (kind, create) decide directly.
    async fn require_root_create(&self, ctx: &RequestContext, kind: NodeKind) -> AppResult<()> {
        for role_id in &ctx.principal.role_ids {
            for capability in self.roles.capabilities_for(*role_id).await? {
                if capability.kind == kind
                    && capability.action == Action::Create
                    && capability.level != Capability::None
                {
                    return Ok(());
                }
            }
        }
        Err(AppError::authorization(format!(
            "Not allowed to create {kind} nodes"
        )))
    }

    /// Rebuild one node's rows inline; on failure fall back to the
    /// outbox so the write is never left permanently stale.
    async fn rebuild_node_guaranteed(&self, node: &ContentNode) -> AppResult<()> {
        if let Err(err) = self.builder.rebuild_for_node(node.node_ref()).await {
            warn!(node = %node.node_ref(), error = %err, "Inline rebuild failed; queueing");
            self.outbox
                .enqueue(node.node_ref(), self.rebuild.max_attempts)
                .await?;
        }
        Ok(())
    }

    /// Rebuild a subtree inline, or queue it when configured for async
    /// book rebuilds (the only fan-out that can reach thousands of rows).
    async fn rebuild_subtree_guaranteed(&self, node: &ContentNode) -> AppResult<()> {
        let node_ref = node.node_ref();
        if node.kind == NodeKind::Book && self.rebuild.async_book_rebuilds {
            self.outbox
                .enqueue(node_ref, self.rebuild.max_attempts)
                .await?;
            return Ok(());
        }
        if let Err(err) = self.builder.rebuild_for_subtree(node_ref).await {
            warn!(node = %node_ref, error = %err, "Subtree rebuild failed; queueing");
            self.outbox
                .enqueue(node_ref, self.rebuild.max_attempts)
                .await?;
        }
        Ok(())
    }

    fn log_foreign_fields(&self, kind: NodeKind, input: &NodeInput) {
        let foreign = input.foreign_fields(kind);
        if !foreign.is_empty() {
            debug!(kind = %kind, fields = ?foreign, "Dropping attributes foreign to kind");
        }
    }

    async fn emit(&self, ctx: &RequestContext, event: EntityEvent) {
        self.events
            .emit(DomainEvent::new(Some(ctx.actor_id()), event))
            .await;
    }
}

/// The permission parent consulted for create checks: the chapter for
/// chaptered pages, otherwise the book.
fn parent_of(kind: NodeKind, book_id: Option<i64>, chapter_id: Option<i64>) -> Option<NodeRef> {
    match kind {
        NodeKind::Page => chapter_id
            .map(|id| NodeRef::new(id, NodeKind::Chapter))
            .or_else(|| book_id.map(|id| NodeRef::new(id, NodeKind::Book))),
        NodeKind::Chapter => book_id.map(|id| NodeRef::new(id, NodeKind::Book)),
        NodeKind::Shelf | NodeKind::Book => None,
    }
}
