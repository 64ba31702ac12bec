/// The rendering collaborator a strategy drives.
///
/// Implemented by whatever owns the visual state: a component view, a
/// template context, a test double.
pub trait RenderHandle {
    /// Re-render this handle's view synchronously.
    fn detect_changes(&self);

    /// Flag this view for the next render pass of its owner.
    fn mark_for_check(&self);

    /// Flag the whole tree as dirty.
    fn mark_dirty(&self) {
        self.mark_for_check()
    }
}
