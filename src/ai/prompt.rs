use crate::domain::PromptVariant;

const FULL_PREAMBLE: &str = r#"You recommend social media content that supports a user's personal development.
The user has listed categories describing their goals: subjects they study or activities they practise seriously. A computer science student might list "Computer Science"; a competitive player might list "Basketball".
Be careful when deciding whether content relates to a category. Some content only touches the category to grab attention, for example by riding an influencer's popularity or a new trend. Some content is plain entertainment that merely shares a word with the category while actually being about something else. Some content aims to provoke emotions such as rage or pleasure. Do not recommend any of these: they may be fun to watch but teach nothing that helps the user's goals.
Recommend content that relates to a category and teaches the user something new: an expert or professional sharing experience and advice, drills and practical technique, or information presented in novel ways such as visualizations or in-depth analysis."#;

const SHORT_PREAMBLE: &str =
    "You recommend social media content to users based on their categories.";

const EVALUATION_RULES: &str = r#"When evaluating the video links:
Judge each link on its own against the criteria; whether you recommend one link must have no correlation with whether you recommend another.
Do not recommend content that does not relate to the categories.
Some content looks related because of its appearance or title but has nothing to do with the category. Evaluate the core of the content and whether it will actually educate the user on their category."#;

const OUTPUT_FORMAT: &str = r#"IMPORTANT: For each video link, respond with exactly one line in this format and nothing else:
<url> recommend
<url> not recommend
Do not include explanations, categories, or any other text. Only output the list in the format above.
Video links to evaluate:"#;

/// Renders the classification prompt. Links keep the caller's order.
pub fn build_prompt(urls: &[String], categories: &[String], variant: PromptVariant) -> String {
    let preamble = match variant {
        PromptVariant::Full => FULL_PREAMBLE,
        PromptVariant::Short => SHORT_PREAMBLE,
    };

    let mut prompt = String::with_capacity(
        preamble.len() + EVALUATION_RULES.len() + OUTPUT_FORMAT.len() + urls.len() * 48,
    );
    prompt.push_str(preamble);
    prompt.push_str("\n\nCategories: ");
    prompt.push_str(&categories.join(", "));
    prompt.push_str("\n\n");
    prompt.push_str(EVALUATION_RULES);
    prompt.push_str("\n\n");
    prompt.push_str(OUTPUT_FORMAT);
    for url in urls {
        prompt.push('\n');
        prompt.push_str(url);
    }
    prompt
}
