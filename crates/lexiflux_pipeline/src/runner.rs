use crate::phase::PhaseCell;
use crate::{PipelineError, PipelineHandle, PipelinePhase, PipelineStrategy};
use lexiflux_core::{CancelToken, Dictionary, Page, TermExtractor, WorkerPool};
use lexiflux_wiki::{StreamError, stream_pages};
use std::cell::Cell;
use std::io::BufRead;
use std::panic;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, SyncSender, sync_channel};
use std::thread;

/// Maximum pages per extraction submission.
const EXTRACTION_BATCH_SIZE: usize = 128;

/// Depth of the producer → writer page queue. The producer blocks once
/// the writer falls this far behind.
const PAGE_QUEUE_DEPTH: usize = 512;

/// Start an extraction run in the background and return its handle.
///
/// The orchestrator thread wires the streaming producer, the worker
/// pool, and the single-writer dictionary loop; it owns every resource
/// the strategy's factories return and releases them on every exit
/// path. `on_ended` is delivered exactly once, before the handle's
/// `join` unblocks.
pub fn run_extraction_pipeline<T, S>(strategy: S) -> PipelineHandle
where
    T: Send + 'static,
    S: PipelineStrategy<T>,
{
    let cancel_token = CancelToken::new();
    let phase = PhaseCell::new();

    let orchestrator_token = cancel_token.clone();
    let orchestrator_phase = phase.clone();
    let orchestrator = thread::Builder::new()
        .name("lexiflux-pipeline".to_string())
        .spawn(move || orchestrate(strategy, orchestrator_token, orchestrator_phase))
        .expect("failed to spawn pipeline thread");

    PipelineHandle::new(cancel_token, phase, orchestrator)
}

fn orchestrate<T, S>(
    mut strategy: S,
    cancel_token: CancelToken,
    phase: PhaseCell,
) -> Result<(), PipelineError>
where
    T: Send + 'static,
    S: PipelineStrategy<T>,
{
    let outcome = drive(&mut strategy, &cancel_token, &phase);

    let terminal = match &outcome {
        Ok(()) => PipelinePhase::EndedOk,
        Err(PipelineError::Cancelled) => PipelinePhase::EndedCancelled,
        Err(_) => PipelinePhase::EndedFailed,
    };
    phase.finish(terminal);

    match &outcome {
        Ok(()) => log::info!("[PIPELINE] Run ended successfully"),
        Err(error) => log::warn!("[PIPELINE] Run ended: {}", error),
    }

    strategy.on_ended(outcome.as_ref().err());
    outcome
}

fn drive<T, S>(
    strategy: &mut S,
    cancel_token: &CancelToken,
    phase: &PhaseCell,
) -> Result<(), PipelineError>
where
    T: Send + 'static,
    S: PipelineStrategy<T>,
{
    phase.advance(PipelinePhase::Created, PipelinePhase::Initialising);

    strategy
        .initialize_pipeline()
        .map_err(PipelineError::PreProcessing)?;

    let pool = strategy.create_pool();
    let source = strategy.wiki_source().map_err(PipelineError::PreProcessing)?;
    let extractor = strategy.term_extractor();
    let mut dictionary = strategy
        .create_dictionary()
        .map_err(PipelineError::PreProcessing)?;

    // From here on the dictionary is closed on every exit path.
    if let Err(error) = dictionary.create_schema() {
        report_close_failure(dictionary.as_mut(), strategy);
        return Err(PipelineError::PreProcessing(error.into()));
    }

    phase.advance(PipelinePhase::Initialising, PipelinePhase::Running);

    let pumped = pump(
        strategy,
        &pool,
        source,
        &extractor,
        dictionary.as_mut(),
        cancel_token,
        phase,
    );

    match (pumped, dictionary.close()) {
        (Err(error), close_result) => {
            if let Err(close_error) = close_result {
                log::warn!("[PIPELINE] {}", close_error);
                strategy.on_message(&close_error.to_string());
            }
            Err(error)
        }
        (Ok(()), Err(close_error)) => Err(PipelineError::PostProcessing(close_error.into())),
        (Ok(()), Ok(())) => strategy
            .perform_last_successful_steps()
            .map_err(PipelineError::PostProcessing),
    }
}

fn report_close_failure<T, S>(dictionary: &mut dyn Dictionary<T>, strategy: &S)
where
    T: Send + 'static,
    S: PipelineStrategy<T>,
{
    if let Err(error) = dictionary.close() {
        log::warn!("[PIPELINE] {}", error);
        strategy.on_message(&error.to_string());
    }
}

/// Produce pages, extract in batches, and write terms in document
/// order. Returns `Err(Cancelled)` when the run was stopped early.
fn pump<T, S>(
    strategy: &S,
    pool: &S::Pool,
    source: Box<dyn BufRead + Send>,
    extractor: &TermExtractor<T>,
    dictionary: &mut dyn Dictionary<T>,
    cancel_token: &CancelToken,
    phase: &PhaseCell,
) -> Result<(), PipelineError>
where
    T: Send + 'static,
    S: PipelineStrategy<T>,
{
    let (page_tx, page_rx) = sync_channel::<Page>(PAGE_QUEUE_DEPTH);

    let producer_token = cancel_token.clone();
    let producer = thread::Builder::new()
        .name("lexiflux-producer".to_string())
        .spawn(move || produce(source, page_tx, producer_token))
        .expect("failed to spawn producer thread");

    let mut cancelled = false;

    'writing: loop {
        if cancel_token.is_cancelled() {
            cancelled = true;
            break;
        }

        let batch = next_batch(&page_rx);
        if batch.is_empty() {
            break;
        }

        log::debug!("[PIPELINE] Extracting batch of {} pages", batch.len());
        let batch_extractor = Arc::clone(extractor);
        let outcomes = pool.map(move |page: Page| (batch_extractor)(&page), batch);

        for outcome in outcomes {
            match outcome {
                Ok(terms) => {
                    for term in terms {
                        if let Err(error) = dictionary.add_term(term) {
                            log::warn!("[WRITER] {}", error);
                            strategy.on_message(&error.to_string());
                        }
                    }
                }
                Err(error) => {
                    log::warn!("[WRITER] {}", error);
                    strategy.on_message(&error.to_string());
                }
            }

            if cancel_token.is_cancelled() {
                cancelled = true;
                break 'writing;
            }
        }
    }

    phase.advance(PipelinePhase::Running, PipelinePhase::Draining);

    // Closing the receiver unblocks a producer waiting on a full
    // queue; it then stops at the next page boundary.
    drop(page_rx);
    match producer.join() {
        Ok(Ok(())) => {}
        Ok(Err(stream_failure)) => {
            // Truncated dumps still yield useful output: everything
            // extracted before the error is the result.
            log::warn!("[PRODUCER] {}", stream_failure);
            strategy.on_message(&stream_failure);
        }
        Err(payload) => panic::resume_unwind(payload),
    }

    if cancelled || cancel_token.is_cancelled() {
        return Err(PipelineError::Cancelled);
    }

    Ok(())
}

/// Drive the streaming parser, feeding pages into the writer queue.
///
/// Returns `Err` only for a genuine stream failure; cooperative stops
/// are a clean exit.
fn produce(
    source: Box<dyn BufRead + Send>,
    page_tx: SyncSender<Page>,
    cancel_token: CancelToken,
) -> Result<(), String> {
    let writer_gone = Cell::new(false);

    let result = stream_pages(
        source,
        |page| {
            if page_tx.send(page).is_err() {
                writer_gone.set(true);
            }
        },
        || !cancel_token.is_cancelled() && !writer_gone.get(),
    );

    match result {
        Ok(()) => Ok(()),
        Err(StreamError::Cancelled) => {
            log::info!("[PRODUCER] Page streaming stopped cooperatively");
            Ok(())
        }
        Err(StreamError::Xml(error)) => Err(format!("Wiki stream ended early: {}", error)),
    }
}

/// Collect the next batch: block for the first page, then absorb
/// whatever is already queued, up to the batch cap.
fn next_batch(page_rx: &Receiver<Page>) -> Vec<Page> {
    let mut batch = Vec::new();

    match page_rx.recv() {
        Ok(page) => batch.push(page),
        Err(_) => return batch,
    }

    while batch.len() < EXTRACTION_BATCH_SIZE {
        match page_rx.try_recv() {
            Ok(page) => batch.push(page),
            Err(_) => break,
        }
    }

    batch
}
