//! Prompt text for every model request the assistant makes.
//!
//! Keeping all wording here means a prompt tweak is a one-file change and
//! unit tests can inspect the exact text without a model.

/// Hashtag directive when hashtags are disabled.
pub const NO_HASHTAGS: &str = "Do not add any hashtags.";

/// Hashtag directive when hashtags are enabled without an explicit list.
pub const RELEVANT_HASHTAGS: &str = "Include relevant hashtags at the end of the post.";

/// Emoji directive when emojis are enabled.
pub const INCLUDE_EMOJIS: &str = "Include emojis.";

/// Emoji directive when emojis are disabled.
pub const NO_EMOJIS: &str = "Do not include emojis.";

/// Output-format directive closing every generation instruction.
pub const JSON_ARRAY_OUTPUT: &str = "Return only the posts as a JSON array of strings, with each post using \\n for new lines. \
Do not include any text outside the JSON block. Each post should be clearly formatted for LinkedIn.";

/// Prefix of the user turn in a refinement request.
pub const REFINE_USER_PREFIX: &str = "Here is the post to refine:\n\n";

/// Hashtag directive carrying the user's own tags.
pub fn exact_hashtags(list: &str) -> String {
    format!(
        "Include these hashtags at the end of the post: {}. Also, suggest 2-3 more relevant hashtags to add.",
        list
    )
}

/// The four raw fields folded into one descriptive sentence.
pub fn combine_fields(topic: &str, post_type: &str, tone: &str, audience: &str) -> String {
    format!(
        "Topic: {}. Post type: {}. Tone: {}. Audience: {}.",
        topic, post_type, tone, audience
    )
}

/// Instruction asking the model to normalise the combined fields into JSON.
pub fn extraction_prompt(combined: &str) -> String {
    format!(
        "You are an expert in extracting only relevant information from any text.\n\
Extract structured information from the following user input:\n\
{combined}\n\n\
Return a JSON object with the following keys:\n\
- topic: The main topic of the post\n\
- post_type: The type of post (e.g. announcement, story, tip)\n\
- tone: The desired tone of the post (e.g. excited, humble)\n\
- audience: The target audience for the post (e.g. recruiters, students)\n\
Ensure the output is a valid JSON object with no additional text."
    )
}

/// The post-generation instruction.
pub fn generation_instruction(
    variations: u8,
    tone: &str,
    post_type: &str,
    audience: &str,
    topic: &str,
    hashtag_directive: &str,
    emoji_directive: &str,
) -> String {
    let versions = if variations == 1 {
        "1 version".to_string()
    } else {
        format!("{} different versions", variations)
    };
    format!(
        "Write {versions} of a {tone} LinkedIn {post_type} targeted at {audience} about: {topic}. \
{hashtag_directive} {emoji_directive} {JSON_ARRAY_OUTPUT}"
    )
}

/// System turn of a refinement request.
///
/// `instruction`, when present, is appended last so it can override the
/// stylistic guidance that precedes it.
pub fn refinement_context(
    tone: &str,
    post_type: &str,
    audience: &str,
    topic: &str,
    hashtag_directive: &str,
    emoji_directive: &str,
    instruction: Option<&str>,
) -> String {
    let mut prompt = format!(
        "You are an expert LinkedIn copywriter refining a draft post.\n\
The post was written as a {tone} LinkedIn {post_type} targeted at {audience} about: {topic}.\n\
{hashtag_directive} {emoji_directive}\n\
Improve clarity, flow and impact while keeping the author's voice and every factual claim.\n\
Return only the refined post text. Do not add commentary, quotes or a JSON wrapper."
    );
    if let Some(extra) = instruction {
        prompt.push_str("\n\nAdditional instruction from the author (takes priority over the guidance above): ");
        prompt.push_str(extra);
    }
    prompt
}

/// Instruction for a study cheatsheet.
pub fn cheatsheet_prompt(
    topic: &str,
    difficulty: &str,
    kind: &str,
    length: &str,
    custom_requirements: Option<&str>,
) -> String {
    let mut prompt = format!(
        "You are an expert in creating study cheatsheets.\n\
Create a {difficulty} level cheatsheet for '{topic}'.\n\
This should be a {kind} with {length} content.\n\n\
Content requirements:\n\
- Include: core concepts only\n\
- Well-organized with clear sections and headings\n\
- Use bullet points and numbered lists for easy scanning\n\
- Make it comprehensive but concise for quick reference\n\
- Format using markdown with clear structure"
    );
    if let Some(focus) = custom_requirements {
        prompt.push_str("\n- Special focus: ");
        prompt.push_str(focus);
    }
    prompt.push_str("\n\nReturn only the cheatsheet content formatted in clean markdown.");
    prompt
}

/// Instruction for resume feedback targeting `role`.
pub fn resume_review_prompt(role: &str, resume_text: &str) -> String {
    format!(
        "You are an expert resume reviewer and interviewer for the position of '{role}'.\n\
First, determine if the provided content is a resume. If not, reply: \"This PDF does not appear to be a resume.\" and briefly explain why.\n\
Next, check if the role '{role}' matches the resume content. If not, reply: \"The role '{role}' does not seem to match the content of the resume. Please check the role and try again.\"\n\
If it is a resume and the role matches, provide concise, actionable suggestions to improve the resume for the '{role}' role. Only use information from the resume; do not fabricate details.\n\
Add suggestions to include important keywords relevant to the role.\n\
Add suggestions to remove buzzwords and make it more impactful.\n\
Focus your feedback on:\n\
- Education\n\
- Experience\n\
- Skills\n\
- Projects\n\
Here is the resume content:\n\
<resume>\n\
{resume_text}\n\
</resume>\n\
Return only the suggestions, using \\n for new lines. Do not include any text other than the suggestions or the message about the PDF not being a resume."
    )
}
