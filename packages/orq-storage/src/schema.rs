pub fn render_schema() -> &'static str {
	"\
CREATE TABLE IF NOT EXISTS conversation_checkpoints (
	thread_id  TEXT PRIMARY KEY,
	snapshot   JSONB NOT NULL,
	updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX IF NOT EXISTS idx_conversation_checkpoints_updated_at
	ON conversation_checkpoints (updated_at)"
}
