//! Prompt construction for every provider call in the pipeline.

use storyloom_core::{ImageRequest, Message, SpeechRequest, StoryParams, TextRequest};

const TEXT_MAX_TOKENS: u32 = 4000;
const TEXT_TEMPERATURE: f32 = 0.8;

/// System instructions for the story text.
///
/// Spells out the exact marker format the parser looks for.
pub fn system_prompt(params: &StoryParams) -> String {
    let mut prompt = format!(
        "You are a children's author writing an illustrated picture book for a {age}-year-old reader.\n\
         Write in the language with tag \"{language}\".\n\
         {guidance}\n\
         The story has exactly {pages} pages of two to four sentences each.\n\
         Never describe illustrations, images or camera directions; write only the words a reader sees.\n\n\
         Format your answer exactly like this:\n\
         Title: <story title>\n\
         Page 1\n<text of page 1>\n\
         Page 2\n<text of page 2>\n\
         ...and so on up to Page {pages}.",
        age = params.protagonist_age(),
        language = params.language(),
        guidance = params.reading_level().guidance(),
        pages = params.page_count(),
    );
    if let Some(moral) = params.moral() {
        prompt.push_str(&format!(
            "\n\nThe story should gently teach this lesson without stating it as a rule: {}.",
            moral
        ));
    }
    prompt
}

/// The user turn asking for the story.
pub fn story_prompt(params: &StoryParams) -> String {
    format!(
        "Write a {theme} story about {name}, age {age}, set in {setting}.",
        theme = params.theme(),
        name = params.protagonist_name(),
        age = params.protagonist_age(),
        setting = params.setting(),
    )
}

/// Complete text request for the narrative stage.
///
/// # Examples
///
/// ```
/// use storyloom_core::StoryParams;
/// use storyloom_narrative::prompts;
///
/// let params = StoryParams::builder()
///     .protagonist_name("Luna")
///     .protagonist_age(6u8)
///     .theme("ocean")
///     .setting("a coral reef")
///     .style("watercolor")
///     .page_count(5usize)
///     .moral("sharing makes friends")
///     .build()
///     .unwrap();
///
/// let request = prompts::narrative_request(&params);
/// assert!(request.system.contains("exactly 5 pages"));
/// assert!(request.system.contains("sharing makes friends"));
/// assert!(request.user.contains("Luna"));
/// ```
pub fn narrative_request(params: &StoryParams) -> TextRequest {
    TextRequest {
        system: system_prompt(params),
        history: Vec::<Message>::new(),
        user: story_prompt(params),
        max_tokens: Some(TEXT_MAX_TOKENS),
        temperature: Some(TEXT_TEMPERATURE),
    }
}

/// Cover illustration request.
pub fn cover_request(params: &StoryParams, title: &str) -> ImageRequest {
    ImageRequest {
        prompt: format!(
            "Book cover illustration in {style} style for a children's story titled \"{title}\". \
             {name}, a {age}-year-old child, in {setting}. Warm, inviting, no text or lettering.",
            style = params.style(),
            title = title,
            name = params.protagonist_name(),
            age = params.protagonist_age(),
            setting = params.setting(),
        ),
        size: None,
    }
}

/// Illustration request for one page.
pub fn page_request(params: &StoryParams, index: usize, text: &str) -> ImageRequest {
    ImageRequest {
        prompt: format!(
            "Children's book illustration in {style} style, page {page}. \
             Setting: {setting}. Main character: {name}, age {age}. \
             Scene: {text} No text or lettering.",
            style = params.style(),
            page = index + 1,
            setting = params.setting(),
            name = params.protagonist_name(),
            age = params.protagonist_age(),
            text = text,
        ),
        size: None,
    }
}

/// Narration request for one page.
pub fn narration_request(text: &str, voice_id: Option<&str>) -> SpeechRequest {
    SpeechRequest {
        text: text.to_string(),
        voice_id: voice_id.map(str::to_string),
    }
}
