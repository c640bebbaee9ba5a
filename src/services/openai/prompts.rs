/// Prompt asking for an engaging first-person summary of a video transcript.
pub fn youtube_summary_prompt(transcript: &str) -> String {
    format!(
        "You are an expert at creative summaries of videos.
Your task is to generate a summary of the video transcript for youtube.
The goal is to have the summary be engaging and informative and to make people want to watch the video.

Summarize the video transcript in 1000 words and use AI and ChatGPT as much as it makes sense,
but make sure it is still readable by humans.
Also use first person pronouns like \"I\" and \"me\" to make it more personal.
Transcript enclosed in triple backticks.

Transcript: ```{transcript}```
"
    )
}
