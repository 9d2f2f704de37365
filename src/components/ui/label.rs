#![allow(dead_code)]

use leptos::prelude::*;
use tw_merge::*;

#[allow(dead_code)]
#[component]
pub fn Label(
    #[prop(optional, into)] class: String,
    #[prop(optional, into)] html_for: String,
    children: Children,
) -> impl IntoView {
    let peer_classes = if !html_for.is_empty() {
        format!(
            "peer-disabled/{}:cursor-not-allowed peer-disabled/{}:opacity-50",
            html_for, html_for
        )
    } else {
        "peer-disabled:cursor-not-allowed peer-disabled:opacity-50".to_string()
    };

    let class = tw_merge!(
        "flex items-center gap-2 text-sm leading-none font-medium select-none group-data-[disabled=true]:pointer-events-none group-data-[disabled=true]:opacity-50",
        &peer_classes,
        class
    );

    view! {
        <label class=class r#for=html_for>
            {children()}
        </label>
    }
}
