use formwork::submit::ConfirmRequest;
use leptos::prelude::*;

/// Confirmation dialog for intercepted links.
///
/// Shown while `pending` holds a request. The user's answer is written to
/// `answer` and the dialog closes.
#[component]
pub fn ConfirmModal(
    pending: RwSignal<Option<ConfirmRequest>>,
    answer: RwSignal<Option<(ConfirmRequest, bool)>>,
) -> impl IntoView {
    let respond = move |accepted: bool| {
        if let Some(request) = pending.get_untracked() {
            answer.set(Some((request, accepted)));
        }
        pending.set(None);
    };

    view! {
        {move || pending.get().map(|request| view! {
            <div class="modal d-block" tabindex="-1" role="dialog" style="background-color: rgba(0, 0, 0, 0.5)">
                <div class="modal-dialog" role="document">
                    <div class="modal-content">
                        {request.title().map(|title| view! {
                            <div class="modal-header">
                                <h5 class="modal-title">{title.to_string()}</h5>
                            </div>
                        })}
                        <div class="modal-body">
                            <p>{request.message().to_string()}</p>
                        </div>
                        <div class="modal-footer">
                            <button type="button" class="btn btn-secondary" on:click=move |_| respond(false)>
                                "Cancel"
                            </button>
                            <button type="button" class="btn btn-primary" on:click=move |_| respond(true)>
                                "OK"
                            </button>
                        </div>
                    </div>
                </div>
            </div>
        })}
    }
}
