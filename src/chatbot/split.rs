//! Text splitting - Spezzatura dei documenti in chunk sovrapposti
//!
//! I documenti (una riga di CSV resa come testo) vengono divisi in chunk di
//! al massimo `CHUNK_SIZE` caratteri con `CHUNK_OVERLAP` caratteri di
//! sovrapposizione tra chunk adiacenti, preferendo il taglio su un confine
//! di paragrafo, riga o parola quando ce n'è uno nella finestra.

/// Dimensione massima di un chunk in caratteri
pub const CHUNK_SIZE: usize = 700;
/// Sovrapposizione tra chunk adiacenti in caratteri
pub const CHUNK_OVERLAP: usize = 150;

/// Trova il confine di char UTF-8 uguale o precedente a `index`
fn floor_char_boundary(text: &str, mut index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Sceglie il punto di taglio dentro `window`: l'ultimo "\n\n", altrimenti
/// l'ultimo "\n", altrimenti l'ultimo spazio. Tagli troppo vicini all'inizio
/// vengono ignorati per non produrre chunk minuscoli.
fn pick_break(window: &str) -> Option<usize> {
    let min_cut = window.len() / 2;
    for separator in ["\n\n", "\n", " "] {
        if let Some(pos) = window.rfind(separator) {
            if pos > min_cut {
                // il separatore resta nel chunk corrente
                return Some(pos + separator.len());
            }
        }
    }
    None
}

/// Allinea l'inizio dell'overlap a un confine di riga o parola, così i
/// chunk non ripartono a metà di una frase. Se nella zona di overlap non
/// c'è nessun confine, si riparte comunque da `from` (overlap a metà parola).
fn align_overlap_start(text: &str, from: usize, end: usize) -> usize {
    let region = &text[from..end];
    if let Some(pos) = region.find('\n') {
        return from + pos + 1;
    }
    if let Some(pos) = region.find(' ') {
        return from + pos + 1;
    }
    from
}

/// Spezza `text` in chunk di al più `chunk_size` caratteri (in byte UTF-8,
/// senza mai tagliare un carattere a metà) con `overlap` di sovrapposizione
/// tra chunk adiacenti.
pub fn split_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    assert!(overlap < chunk_size, "overlap must be smaller than chunk size");

    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }
    if text.len() <= chunk_size {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut start = 0usize;

    while start < text.len() {
        let hard_end = floor_char_boundary(text, start + chunk_size);
        let window = &text[start..hard_end];

        let end = if hard_end == text.len() {
            hard_end
        } else {
            match pick_break(window) {
                Some(cut) => start + cut,
                None => hard_end,
            }
        };

        let chunk = text[start..end].trim();
        if !chunk.is_empty() {
            chunks.push(chunk.to_string());
        }

        if end == text.len() {
            break;
        }

        // il prossimo chunk riparte `overlap` caratteri prima della fine,
        // riallineato al primo confine utile; in ogni caso deve avanzare
        let from = floor_char_boundary(text, end.saturating_sub(overlap).max(start + 1));
        let next_start = align_overlap_start(text, from, end);
        start = if next_start > start { next_start } else { end };
    }

    chunks
}
