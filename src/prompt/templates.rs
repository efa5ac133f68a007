pub const SYSTEM_PROMPT: &str = "You are a concise productivity assistant. \
Always answer with a single JSON object and nothing else.";

pub const SELECTION: &str = r#"Choose the single task the user should work on next.

Session:
- available minutes: {{ max_minutes }}
- mode: {{ mode }}
- energy (1-10): {{ energy }}
{% if avoid_tags %}- avoid tags: {{ avoid_tags }}
{% endif %}{% if prefer_priority %}- preferred priority: {{ prefer_priority }}
{% endif %}
Candidates, highest score first:
{% for c in candidates %}- id={{ c.id }} | {{ c.title }} | priority={{ c.priority }} | minutes={{ c.minutes }} | due={{ c.due }} | tags={{ c.tags }} | score={{ c.score }}
{% endfor %}
Allowed reason codes: {{ reason_codes }}

Reply with one JSON object:
{"task_id": "<id from the list>", "reason_codes": ["<1 to 3 allowed codes>"], "alt_task_ids": ["<up to 2 other ids>"]}
"#;

pub const COACHING: &str = r#"Write a short coaching note for the task the user is about to start.

Task: {{ title }}
Priority: {{ priority }}
{% if minutes %}Estimated minutes: {{ minutes }}
{% endif %}Why it was chosen: {{ reasons }}
Session mode: {{ mode }}

Limits: title at most 100 characters; message 5 to 300 characters and at most 2 sentences; next_step at most 10 words.
Reply with one JSON object:
{"title": "...", "message": "...", "next_step": "..."}
"#;

pub const MOTIVATION: &str = r#"Write one motivational message for the user of a productivity app.

Tone: {{ category }}
Current streak: {{ streak }} days
Level: {{ level }}
{% if completion_rate %}Recent completion rate: {{ completion_rate }}%
{% endif %}{% if context %}Context: {{ context }}
{% endif %}
Keep the message under {{ max_chars }} characters.
Reply with one JSON object:
{"message": "..."}
"#;
