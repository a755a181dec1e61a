//! Diesel table definitions.

diesel::table! {
    stories (id) {
        id -> Uuid,
        title -> Text,
        cover_url -> Text,
        theme -> Text,
        setting -> Text,
        style -> Text,
        language -> Text,
        voice_id -> Nullable<Text>,
        status -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    story_pages (story_id, page_index) {
        story_id -> Uuid,
        page_index -> Int4,
        text -> Text,
        image_url -> Text,
        narration_url -> Nullable<Text>,
    }
}

diesel::joinable!(story_pages -> stories (story_id));

diesel::allow_tables_to_appear_in_same_query!(stories, story_pages);
