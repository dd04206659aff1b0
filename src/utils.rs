use bytes::BytesMut;

/// Serialization into a shared output buffer, avoiding per-part allocations
/// when assembling a header value.
pub(crate) trait BufferWriter {
    fn write_to_buffer(&self, buffer: &mut BytesMut);
}
